//! Handle jerárquico de un nodo de cómputo (solid).
//!
//! Se representa como una lista enlazada inmutable hacia el padre, de modo
//! que recorrer la jerarquía de composición es seguir `parent` hasta `None`.
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SolidHandle {
    name: String,
    parent: Option<Arc<SolidHandle>>,
}

impl SolidHandle {
    pub fn new(name: impl Into<String>, parent: Option<SolidHandle>) -> Self {
        Self { name: name.into(),
               parent: parent.map(Arc::new) }
    }

    /// Construye un handle desde su forma textual `padre.hijo.nieto`.
    pub fn from_path(path: &str) -> Option<Self> {
        path.split('.')
            .filter(|s| !s.is_empty())
            .fold(None, |parent, name| Some(SolidHandle::new(name, parent)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&SolidHandle> {
        self.parent.as_deref()
    }

    /// Itera desde este handle hacia la raíz (incluye `self`).
    pub fn ancestors(&self) -> impl Iterator<Item = &SolidHandle> {
        std::iter::successors(Some(self), |h| h.parent())
    }

    pub fn path(&self) -> Vec<&str> {
        let mut path: Vec<&str> = self.ancestors().map(|h| h.name()).collect();
        path.reverse();
        path
    }
}

impl fmt::Display for SolidHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_round_trips_through_display() {
        let handle = SolidHandle::from_path("outer.inner.leaf").expect("handle");
        assert_eq!(handle.name(), "leaf");
        assert_eq!(handle.to_string(), "outer.inner.leaf");
        let names: Vec<String> = handle.ancestors().map(|h| h.to_string()).collect();
        assert_eq!(names, vec!["outer.inner.leaf", "outer.inner", "outer"]);
    }

    #[test]
    fn empty_path_has_no_handle() {
        assert!(SolidHandle::from_path("").is_none());
    }
}
