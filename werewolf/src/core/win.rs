//! Win-condition evaluation over living role composition.

use crate::core::roster::Roster;
use crate::core::types::Faction;

/// Decide whether the match is over.
///
/// No living werewolves: good wins. Werewolves at least matching everyone
/// else: werewolves win. Otherwise the match continues.
pub fn evaluate(roster: &Roster) -> Option<Faction> {
    let (werewolves, others) = roster.living_counts();
    if werewolves == 0 {
        Some(Faction::Good)
    } else if werewolves >= others {
        Some(Faction::Werewolf)
    } else {
        None
    }
}
