//! The app/desktop/window binding state.
//!
//! [`BindingEngine`] owns the mapping between configured apps, the window
//! classes identifying their windows, and the live windows currently
//! assigned to each app.  It is built once at startup from the
//! [`Registry`] and a full enumeration of the window manager's desktops,
//! then kept current by the lifecycle events the daemon forwards to it.
//!
//! Every app gets a desktop of the same name.  An app desktop must only
//! hold that app's windows: a window of unknown class that shows up on one
//! is moved to the *spare* desktop, a desktop bound to no app.
//!
//! The engine never talks to a window manager on its own; each operation
//! that needs one borrows it for the duration of the call.

use crate::command::{DesktopId, NodeId};
use crate::config::Registry;
use crate::traits::WindowManager;
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap};

/// Name given to a freshly created spare desktop.
pub const SPARE_DESKTOP: &str = "spare";

/// Possible errors from the binding engine.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// The window manager returned an error.
    #[error("window manager error: {0}")]
    WindowManager(String),
}

fn wm_err<E: std::error::Error>(e: E) -> BindingError {
    BindingError::WindowManager(e.to_string())
}

/// What [`BindingEngine::classify_window`] did with a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The window belongs to this app and is now tracked.
    Tracked(String),
    /// Unknown class on an app desktop: moved to the spare desktop.
    Relocated,
    /// Unknown class elsewhere: left alone.
    Ignored,
}

/// Owns the app/window mapping.
#[derive(Debug)]
pub struct BindingEngine {
    registry: Registry,
    /// `window class -> app name`
    class_index: HashMap<String, String>,
    /// `app name -> windows`, one entry per configured app.
    app_windows: HashMap<String, BTreeSet<NodeId>>,
    /// `window -> app name`
    window_owner: HashMap<NodeId, String>,
    spare: String,
}

impl BindingEngine {
    /// Bind `registry` to the window manager.
    ///
    /// Creates a desktop per app (reusing one that already carries the
    /// app's name), picks the spare desktop, then classifies every window
    /// that is already open.  Only the desktop queries and creations are
    /// fatal; per-window failures are logged.
    pub fn initialize<W: WindowManager>(registry: Registry, wm: &W) -> Result<Self, BindingError> {
        let existing = wm.desktops().map_err(wm_err)?;
        for app in registry.apps() {
            if existing.iter().any(|d| d.name == app.name) {
                debug!("reusing desktop {}", app.name);
            } else {
                info!("creating desktop {}", app.name);
                wm.create_desktop(&app.name).map_err(wm_err)?;
            }
        }

        let class_index = build_class_index(&registry);
        let app_windows = registry
            .names()
            .map(|name| (name.to_string(), BTreeSet::new()))
            .collect();

        let mut engine = Self {
            registry,
            class_index,
            app_windows,
            window_owner: HashMap::new(),
            spare: String::new(),
        };
        engine.spare = engine.find_spare(wm, None)?;
        info!("spare desktop is {}", engine.spare);

        // Enumerate first, classify second: relocations change the tree.
        // A window that fails to classify (it may have closed since the
        // enumeration) is skipped.
        let desktops = wm.desktops().map_err(wm_err)?;
        for desktop in &desktops {
            for &window in &desktop.windows {
                if let Err(e) = engine.classify_on(wm, window, Some(desktop.name.as_str())) {
                    warn!("skipping {} on {}: {}", window, desktop.name, e);
                }
            }
        }
        info!(
            "tracking {} window(s) across {} app(s)",
            engine.window_owner.len(),
            engine.registry.len()
        );
        Ok(engine)
    }

    /// Classify a window that appeared on `desktop`.
    pub fn classify_window<W: WindowManager>(
        &mut self,
        wm: &W,
        window: NodeId,
        desktop: DesktopId,
    ) -> Result<Classification, BindingError> {
        if let Some(app) = self.app_for_window(wm, window)? {
            return Ok(self.track(window, app));
        }
        let name = wm.desktop_name(desktop).map_err(wm_err)?;
        self.place_unclassified(wm, window, name.as_deref())
    }

    /// Same as [`classify_window`](Self::classify_window) when the
    /// desktop's name is already known.
    fn classify_on<W: WindowManager>(
        &mut self,
        wm: &W,
        window: NodeId,
        desktop_name: Option<&str>,
    ) -> Result<Classification, BindingError> {
        match self.app_for_window(wm, window)? {
            Some(app) => Ok(self.track(window, app)),
            None => self.place_unclassified(wm, window, desktop_name),
        }
    }

    fn app_for_window<W: WindowManager>(
        &self,
        wm: &W,
        window: NodeId,
    ) -> Result<Option<String>, BindingError> {
        let class = wm.window_class(window).map_err(wm_err)?;
        Ok(class.and_then(|c| self.class_index.get(&c).cloned()))
    }

    fn track(&mut self, window: NodeId, app: String) -> Classification {
        if let Some(previous) = self.window_owner.get(&window) {
            if *previous != app {
                if let Some(set) = self.app_windows.get_mut(previous) {
                    set.remove(&window);
                }
            }
        }
        self.app_windows
            .entry(app.clone())
            .or_default()
            .insert(window);
        self.window_owner.insert(window, app.clone());
        debug!("{} belongs to {}", window, app);
        Classification::Tracked(app)
    }

    fn place_unclassified<W: WindowManager>(
        &mut self,
        wm: &W,
        window: NodeId,
        desktop_name: Option<&str>,
    ) -> Result<Classification, BindingError> {
        self.release_window(window);
        match desktop_name {
            Some(name) if self.registry.contains(name) => {
                debug!("{} has no app, moving it off {} to {}", window, name, self.spare);
                wm.move_window(window, &self.spare).map_err(wm_err)?;
                Ok(Classification::Relocated)
            }
            _ => Ok(Classification::Ignored),
        }
    }

    /// Forget a destroyed window.  Returns the app it belonged to, if any.
    pub fn release_window(&mut self, window: NodeId) -> Option<String> {
        let app = self.window_owner.remove(&window)?;
        if let Some(set) = self.app_windows.get_mut(&app) {
            set.remove(&window);
        }
        debug!("released {} from {}", window, app);
        Some(app)
    }

    /// React to the removal of a desktop.
    ///
    /// Only the spare desktop matters: when it goes away a new one is
    /// picked.  Returns `true` if the spare desktop was recomputed.
    ///
    /// An app desktop removed behind the daemon's back is not recreated;
    /// that app's state stays stale until restart.
    pub fn on_desktop_removed<W: WindowManager>(
        &mut self,
        wm: &W,
        desktop: DesktopId,
    ) -> Result<bool, BindingError> {
        let gone = match wm.desktop_name(desktop).map_err(wm_err)? {
            Some(name) if name == self.spare => true,
            Some(_) => false,
            // The id no longer resolves, so ask whether the spare survived.
            None => !wm
                .desktops()
                .map_err(wm_err)?
                .iter()
                .any(|d| d.name == self.spare),
        };
        if !gone {
            return Ok(false);
        }
        let removed = std::mem::take(&mut self.spare);
        self.spare = self.find_spare(wm, Some(removed.as_str()))?;
        info!("spare desktop {} removed, now using {}", removed, self.spare);
        Ok(true)
    }

    /// Pick a desktop bound to no app, creating one if every desktop is an
    /// app desktop.  `exclude` names a desktop that is about to disappear.
    fn find_spare<W: WindowManager>(
        &self,
        wm: &W,
        exclude: Option<&str>,
    ) -> Result<String, BindingError> {
        let desktops = wm.desktops().map_err(wm_err)?;
        if let Some(d) = desktops
            .iter()
            .find(|d| !self.registry.contains(&d.name) && Some(d.name.as_str()) != exclude)
        {
            return Ok(d.name.clone());
        }
        let name = self.fresh_spare_name();
        info!("creating desktop {}", name);
        wm.create_desktop(&name).map_err(wm_err)?;
        Ok(name)
    }

    /// `spare`, or `spare-N` if an app already uses that name.
    fn fresh_spare_name(&self) -> String {
        let mut name = SPARE_DESKTOP.to_string();
        let mut n = 0;
        while self.registry.contains(&name) {
            n += 1;
            name = format!("{}-{}", SPARE_DESKTOP, n);
        }
        name
    }

    /// Remove every app desktop.
    ///
    /// Failures are logged and skipped so one stuck desktop does not keep
    /// the others around.
    pub fn shutdown<W: WindowManager>(&self, wm: &W) {
        for name in self.registry.names() {
            if let Err(e) = wm.remove_desktop(name) {
                warn!("failed to remove desktop {}: {}", name, e);
            }
        }
    }

    /// Whether `app` currently has any tracked windows.
    pub fn has_live_windows(&self, app: &str) -> bool {
        self.app_windows.get(app).is_some_and(|set| !set.is_empty())
    }

    /// Windows tracked for `app`, in id order.
    pub fn windows_of(&self, app: &str) -> Vec<NodeId> {
        self.app_windows
            .get(app)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn owner_of(&self, window: NodeId) -> Option<&str> {
        self.window_owner.get(&window).map(String::as_str)
    }

    /// App owning windows of `class`, if any.
    pub fn app_for_class(&self, class: &str) -> Option<&str> {
        self.class_index.get(class).map(String::as_str)
    }

    pub fn spare_desktop(&self) -> &str {
        &self.spare
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of tracked windows across all apps.
    pub fn tracked(&self) -> usize {
        self.window_owner.len()
    }
}

/// `class -> app`, first app in registry order wins a shared class.
fn build_class_index(registry: &Registry) -> HashMap<String, String> {
    let mut index: HashMap<String, String> = HashMap::new();
    for app in registry.apps() {
        for class in &app.classes {
            match index.get(class) {
                Some(owner) if *owner != app.name => {
                    warn!(
                        "class {} is claimed by both {} and {}, keeping {}",
                        class, owner, app.name, owner
                    );
                }
                Some(_) => {}
                None => {
                    index.insert(class.clone(), app.name.clone());
                }
            }
        }
    }
    index
}

//  Tests
