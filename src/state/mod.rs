// Runtime context module
//
// Wraps GameVars with thread-safe access using Arc<RwLock<T>>. Store locators
// read it on every access so that switching game or VR mode retargets the
// per-game YAML files immediately.

use crate::models::GameVars;
use std::sync::{Arc, PoisonError, RwLock};

/// Change events reported when the context is modified
#[derive(Clone, Debug, PartialEq)]
pub enum ContextChange {
    /// The managed game has been switched
    GameChanged { game: String },

    /// VR mode has been toggled
    VrModeChanged { vr: bool },
}

/// Thread-safe holder of the active [`GameVars`].
///
/// Cloning a `ContextManager` shares the same underlying context.
#[derive(Debug, Clone, Default)]
pub struct ContextManager {
    vars: Arc<RwLock<GameVars>>,
}

impl ContextManager {
    pub fn new(vars: GameVars) -> Self {
        Self {
            vars: Arc::new(RwLock::new(vars)),
        }
    }

    /// Get a copy of the current context
    pub fn snapshot(&self) -> GameVars {
        self.read(|vars| vars.clone())
    }

    /// Execute a function with read access to the context
    ///
    /// # Example
    /// ```ignore
    /// let prefix = context.read(|vars| vars.info_section());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&GameVars) -> R,
    {
        let vars = self.vars.read().unwrap_or_else(PoisonError::into_inner);
        f(&vars)
    }

    /// Update the context and report what changed
    pub fn update<F>(&self, update_fn: F) -> Vec<ContextChange>
    where
        F: FnOnce(&mut GameVars),
    {
        let mut vars = self.vars.write().unwrap_or_else(PoisonError::into_inner);
        let old = vars.clone();
        update_fn(&mut vars);

        let mut changes = Vec::new();
        if old.game != vars.game {
            changes.push(ContextChange::GameChanged {
                game: vars.game.clone(),
            });
        }
        if old.vr != vars.vr {
            changes.push(ContextChange::VrModeChanged { vr: vars.vr });
        }

        for change in &changes {
            tracing::debug!("Context change: {:?}", change);
        }
        changes
    }

    /// Switch the managed game
    pub fn set_game(&self, game: impl Into<String>) -> Vec<ContextChange> {
        let game = game.into();
        self.update(|vars| vars.game = game)
    }

    /// Toggle VR mode
    pub fn set_vr(&self, vr: bool) -> Vec<ContextChange> {
        self.update(|vars| vars.vr = vr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context() {
        let context = ContextManager::default();
        assert_eq!(context.snapshot(), GameVars::new("Fallout4", false));
    }

    #[test]
    fn test_update_reports_changes() {
        let context = ContextManager::default();

        let changes = context.set_vr(true);
        assert_eq!(changes, vec![ContextChange::VrModeChanged { vr: true }]);

        let changes = context.set_vr(true);
        assert!(changes.is_empty());

        let changes = context.update(|vars| {
            vars.game = "SkyrimSE".to_string();
            vars.vr = false;
        });
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_clones_share_context() {
        let context = ContextManager::default();
        let shared = context.clone();

        context.set_game("Starfield");
        assert_eq!(shared.read(|vars| vars.game.clone()), "Starfield");
    }
}
