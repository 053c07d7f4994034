//! Recording test doubles shared by the engine, dispatcher and daemon tests.

use crate::command::{DesktopId, DesktopInfo, NodeId, FOCUSED_DESKTOP};
use crate::process::ProcessError;
use crate::traits::{ProcessRunner, WindowManager};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

/// In-memory window manager.
///
/// Mutations are applied to its desktop list and recorded in `ops`;
/// queries are recorded in `queries`.
#[derive(Debug, Default)]
pub struct FakeWm {
    pub desktops: RefCell<Vec<DesktopInfo>>,
    pub classes: RefCell<HashMap<NodeId, String>>,
    pub focused: RefCell<String>,
    pub ops: RefCell<Vec<String>>,
    pub queries: RefCell<Vec<String>>,
    /// Windows whose moves fail, as if they closed mid-request.
    pub vanished: RefCell<HashSet<NodeId>>,
    next_id: Cell<u32>,
}

#[derive(Debug, thiserror::Error)]
#[error("fake wm error: {0}")]
pub struct FakeWmError(pub String);

impl FakeWm {
    /// A window manager with the given (initially empty) desktops; the first
    /// one has focus.
    pub fn with_desktops(names: &[&str]) -> Self {
        let wm = Self::default();
        wm.next_id.set(0x0020_0001);
        for name in names {
            wm.add_desktop(name);
        }
        if let Some(first) = names.first() {
            *wm.focused.borrow_mut() = first.to_string();
        }
        wm
    }

    fn add_desktop(&self, name: &str) -> DesktopId {
        let id = DesktopId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.desktops.borrow_mut().push(DesktopInfo {
            id,
            name: name.to_string(),
            windows: Vec::new(),
        });
        id
    }

    pub fn desktop_id(&self, name: &str) -> DesktopId {
        self.desktops
            .borrow()
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.id)
            .unwrap_or_else(|| panic!("no desktop {}", name))
    }

    pub fn desktop_names(&self) -> Vec<String> {
        self.desktops.borrow().iter().map(|d| d.name.clone()).collect()
    }

    /// Open a window of `class` (or without a class) on desktop `name`.
    pub fn open_window(&self, id: NodeId, class: Option<&str>, desktop: &str) -> DesktopId {
        if let Some(class) = class {
            self.classes.borrow_mut().insert(id, class.to_string());
        }
        let mut desktops = self.desktops.borrow_mut();
        let d = desktops
            .iter_mut()
            .find(|d| d.name == desktop)
            .unwrap_or_else(|| panic!("no desktop {}", desktop));
        d.windows.push(id);
        d.id
    }

    /// Drop a desktop without going through `remove_desktop`, as if the user
    /// removed it.  Returns its id.
    pub fn drop_desktop(&self, name: &str) -> DesktopId {
        let id = self.desktop_id(name);
        self.desktops.borrow_mut().retain(|d| d.name != name);
        id
    }

    /// Desktop currently holding `window`.
    pub fn location(&self, window: NodeId) -> Option<String> {
        self.desktops
            .borrow()
            .iter()
            .find(|d| d.windows.contains(&window))
            .map(|d| d.name.clone())
    }

    /// Make every later move of `window` fail.
    pub fn vanish(&self, window: NodeId) {
        self.vanished.borrow_mut().insert(window);
    }

    pub fn clear_log(&self) {
        self.ops.borrow_mut().clear();
        self.queries.borrow_mut().clear();
    }
}

impl WindowManager for FakeWm {
    type Error = FakeWmError;

    fn create_desktop(&self, name: &str) -> Result<(), FakeWmError> {
        self.ops.borrow_mut().push(format!("create {}", name));
        self.add_desktop(name);
        Ok(())
    }

    fn remove_desktop(&self, name: &str) -> Result<(), FakeWmError> {
        self.ops.borrow_mut().push(format!("remove {}", name));
        self.desktops.borrow_mut().retain(|d| d.name != name);
        Ok(())
    }

    fn focus_desktop(&self, name: &str) -> Result<(), FakeWmError> {
        self.ops.borrow_mut().push(format!("focus {}", name));
        if !self.desktops.borrow().iter().any(|d| d.name == name) {
            return Err(FakeWmError(format!("no desktop {}", name)));
        }
        *self.focused.borrow_mut() = name.to_string();
        Ok(())
    }

    fn move_window(&self, window: NodeId, desktop: &str) -> Result<(), FakeWmError> {
        self.ops
            .borrow_mut()
            .push(format!("move {} {}", window, desktop));
        if self.vanished.borrow().contains(&window) {
            return Err(FakeWmError(format!("no window {}", window)));
        }
        let target = if desktop == FOCUSED_DESKTOP {
            self.focused.borrow().clone()
        } else {
            desktop.to_string()
        };
        let mut desktops = self.desktops.borrow_mut();
        if !desktops.iter().any(|d| d.name == target) {
            return Err(FakeWmError(format!("no desktop {}", target)));
        }
        for d in desktops.iter_mut() {
            d.windows.retain(|w| *w != window);
        }
        if let Some(d) = desktops.iter_mut().find(|d| d.name == target) {
            d.windows.push(window);
        }
        Ok(())
    }

    fn desktops(&self) -> Result<Vec<DesktopInfo>, FakeWmError> {
        self.queries.borrow_mut().push("desktops".into());
        Ok(self.desktops.borrow().clone())
    }

    fn window_class(&self, window: NodeId) -> Result<Option<String>, FakeWmError> {
        self.queries.borrow_mut().push(format!("class {}", window));
        Ok(self.classes.borrow().get(&window).cloned())
    }

    fn desktop_name(&self, desktop: DesktopId) -> Result<Option<String>, FakeWmError> {
        self.queries.borrow_mut().push(format!("name {}", desktop));
        Ok(self
            .desktops
            .borrow()
            .iter()
            .find(|d| d.id == desktop)
            .map(|d| d.name.clone()))
    }
}

/// Process runner that records launches and answers captures with a fixed
/// output.
#[derive(Debug, Default)]
pub struct FakeRunner {
    pub detached: RefCell<Vec<Vec<String>>>,
    pub captured: RefCell<Vec<(Vec<String>, Option<Vec<u8>>)>>,
    pub capture_output: Vec<u8>,
}

impl FakeRunner {
    pub fn answering(output: &str) -> Self {
        Self {
            capture_output: output.as_bytes().to_vec(),
            ..Self::default()
        }
    }

    /// The shell command lines passed to `sh -c` for detached launches.
    pub fn launched(&self) -> Vec<String> {
        self.detached
            .borrow()
            .iter()
            .map(|argv| argv.last().cloned().unwrap_or_default())
            .collect()
    }
}

fn owned(argv: &[&str]) -> Vec<String> {
    argv.iter().map(|s| s.to_string()).collect()
}

impl ProcessRunner for FakeRunner {
    fn run_sync(&self, _argv: &[&str]) -> Result<i32, ProcessError> {
        Ok(0)
    }

    fn run_detached(&self, argv: &[&str]) -> Result<(), ProcessError> {
        self.detached.borrow_mut().push(owned(argv));
        Ok(())
    }

    fn run_capture(&self, argv: &[&str], input: Option<&[u8]>) -> Result<Vec<u8>, ProcessError> {
        self.captured
            .borrow_mut()
            .push((owned(argv), input.map(<[u8]>::to_vec)));
        Ok(self.capture_output.clone())
    }
}
