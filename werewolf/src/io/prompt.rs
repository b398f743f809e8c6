//! Prompt template store keyed by symbolic name.
//!
//! Built-in templates ship with the binary. A prompts directory may override
//! them or add new keys (`<key>.md`). Looking up a key that no template
//! provides is not an error: the caller treats it as "no action".

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use minijinja::{Environment, ErrorKind};
use serde::Serialize;
use tracing::debug;

use crate::core::types::Role;

/// Template keys used by the resolvers.
pub mod keys {
    pub const GUARD_NIGHT_ACTION: &str = "guard_night_action";
    pub const WEREWOLF_NIGHT_ACTION: &str = "werewolf_night_action";
    pub const SEER_NIGHT_ACTION: &str = "seer_night_action";
    pub const WITCH_SAVE_ACTION: &str = "witch_save_action";
    pub const WITCH_POISON_ACTION: &str = "witch_poison_action";
    pub const PLAYER_SPEAK: &str = "player_speak";
    pub const PLAYER_VOTE: &str = "player_vote";
    pub const HUNTER_SHOOT_ACTION: &str = "hunter_shoot_action";
    pub const IDIOT_REVEAL_ACTION: &str = "idiot_reveal_action";
}

/// Key of the optional night reflection prompt for `role`.
pub fn reflection_key(role: Role) -> String {
    format!("{}_night_reflection", role.as_str())
}

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        keys::GUARD_NIGHT_ACTION,
        include_str!("prompts/guard_night_action.md"),
    ),
    (
        keys::WEREWOLF_NIGHT_ACTION,
        include_str!("prompts/werewolf_night_action.md"),
    ),
    (
        keys::SEER_NIGHT_ACTION,
        include_str!("prompts/seer_night_action.md"),
    ),
    (
        keys::WITCH_SAVE_ACTION,
        include_str!("prompts/witch_save_action.md"),
    ),
    (
        keys::WITCH_POISON_ACTION,
        include_str!("prompts/witch_poison_action.md"),
    ),
    (
        "villager_night_reflection",
        include_str!("prompts/villager_night_reflection.md"),
    ),
    (
        "hunter_night_reflection",
        include_str!("prompts/hunter_night_reflection.md"),
    ),
    (
        "idiot_night_reflection",
        include_str!("prompts/idiot_night_reflection.md"),
    ),
    (keys::PLAYER_SPEAK, include_str!("prompts/player_speak.md")),
    (keys::PLAYER_VOTE, include_str!("prompts/player_vote.md")),
    (
        keys::HUNTER_SHOOT_ACTION,
        include_str!("prompts/hunter_shoot_action.md"),
    ),
    (
        keys::IDIOT_REVEAL_ACTION,
        include_str!("prompts/idiot_reveal_action.md"),
    ),
];

/// Template engine wrapper around minijinja.
#[derive(Debug)]
pub struct PromptStore {
    env: Environment<'static>,
}

impl PromptStore {
    /// Store with no templates; every lookup misses.
    pub fn empty() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Store with every built-in template.
    pub fn builtin() -> Self {
        let mut env = Environment::new();
        for (key, source) in BUILTIN_TEMPLATES {
            env.add_template(key, source)
                .expect("built-in prompt template should be valid");
        }
        Self { env }
    }

    /// Built-in templates, overridden or extended by `<key>.md` files in `dir`.
    pub fn with_overrides(dir: &Path) -> Result<Self> {
        let mut store = Self::builtin();
        let entries =
            fs::read_dir(dir).with_context(|| format!("read prompts dir {}", dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("list prompts dir {}", dir.display()))?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            store.insert(key, &fs::read_to_string(&path).with_context(|| {
                format!("read prompt template {}", path.display())
            })?)?;
        }
        Ok(store)
    }

    /// Add or replace a template.
    pub fn insert(&mut self, key: &str, source: &str) -> Result<()> {
        debug!(key, bytes = source.len(), "registering prompt template");
        self.env
            .add_template_owned(key.to_string(), source.to_string())
            .with_context(|| format!("compile prompt template {key}"))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.env.get_template(key).is_ok()
    }

    /// Render `key` with `ctx`. Returns `Ok(None)` when no template has that key.
    pub fn render<S: Serialize>(&self, key: &str, ctx: S) -> Result<Option<String>> {
        let template = match self.env.get_template(key) {
            Ok(template) => template,
            Err(err) if err.kind() == ErrorKind::TemplateNotFound => return Ok(None),
            Err(err) => return Err(err).with_context(|| format!("load prompt template {key}")),
        };
        let rendered = template
            .render(ctx)
            .with_context(|| format!("render prompt template {key}"))?;
        Ok(Some(rendered))
    }
}

/// Write the built-in templates into `dir` as `<key>.md`, skipping existing files unless `force`.
///
/// Returns the paths written.
pub fn write_builtin_templates(dir: &Path, force: bool) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let mut written = Vec::new();
    for (key, source) in BUILTIN_TEMPLATES {
        let path = dir.join(format!("{key}.md"));
        if !force && path.exists() {
            continue;
        }
        fs::write(&path, source).with_context(|| format!("write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn builtins_cover_every_resolver_key() {
        let store = PromptStore::builtin();
        for key in [
            keys::GUARD_NIGHT_ACTION,
            keys::WEREWOLF_NIGHT_ACTION,
            keys::SEER_NIGHT_ACTION,
            keys::WITCH_SAVE_ACTION,
            keys::WITCH_POISON_ACTION,
            keys::PLAYER_SPEAK,
            keys::PLAYER_VOTE,
            keys::HUNTER_SHOOT_ACTION,
            keys::IDIOT_REVEAL_ACTION,
        ] {
            assert!(store.contains(key), "missing built-in {key}");
        }
        for role in [Role::Villager, Role::Hunter, Role::Idiot] {
            assert!(store.contains(&reflection_key(role)));
        }
        assert!(!store.contains(&reflection_key(Role::Werewolf)));
    }

    #[test]
    fn missing_key_renders_none() {
        let store = PromptStore::empty();
        let rendered = store
            .render(keys::PLAYER_VOTE, context! {})
            .expect("render");
        assert!(rendered.is_none());
    }

    #[test]
    fn vote_template_renders_fields() {
        let store = PromptStore::builtin();
        let rendered = store
            .render(
                keys::PLAYER_VOTE,
                context! {
                    player_name => "Ava",
                    role => "Seer",
                    day => 2,
                    public_memory => "[Day 1] Ben says: hi",
                    private_memory => "",
                    living_players => "Ava, Ben",
                    candidates => "Ben",
                    werewolf_peers => Vec::<String>::new(),
                },
            )
            .expect("render")
            .expect("template");
        assert!(rendered.contains("You are Ava, the Seer."));
        assert!(rendered.contains("<public_memory>\n[Day 1] Ben says: hi\n</public_memory>"));
        assert!(rendered.contains("You may vote for: Ben"));
        assert!(!rendered.contains("fellow werewolves"));
    }

    #[test]
    fn overrides_replace_and_extend_builtins() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("player_vote.md"), "Vote, {{ player_name }}!").expect("write");
        fs::write(
            temp.path().join("werewolf_night_reflection.md"),
            "Think, {{ player_name }}.",
        )
        .expect("write");
        fs::write(temp.path().join("notes.txt"), "ignored").expect("write");

        let store = PromptStore::with_overrides(temp.path()).expect("load");
        let vote = store
            .render(keys::PLAYER_VOTE, context! { player_name => "Ben" })
            .expect("render");
        assert_eq!(vote.as_deref(), Some("Vote, Ben!"));
        assert!(store.contains(&reflection_key(Role::Werewolf)));
        assert!(!store.contains("notes"));
    }

    #[test]
    fn write_builtin_templates_respects_force() {
        let temp = tempfile::tempdir().expect("tempdir");
        let written = write_builtin_templates(temp.path(), false).expect("write");
        assert_eq!(written.len(), BUILTIN_TEMPLATES.len());

        fs::write(temp.path().join("player_vote.md"), "custom").expect("write");
        assert!(write_builtin_templates(temp.path(), false).expect("write").is_empty());
        let custom = fs::read_to_string(temp.path().join("player_vote.md")).expect("read");
        assert_eq!(custom, "custom");

        let rewritten = write_builtin_templates(temp.path(), true).expect("write");
        assert_eq!(rewritten.len(), BUILTIN_TEMPLATES.len());
    }
}
