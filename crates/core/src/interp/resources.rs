//! Scoped resource dictionaries.
//!
//! Forms push their own `Resources`; a name is looked up from the innermost
//! scope outwards, so a form without a resource entry still sees the page's.

use crate::model::{ObjectStore, PDFDict, PDFObject};

#[derive(Debug, Clone, Default)]
pub struct ResourceStack {
    frames: Vec<PDFDict>,
}

impl ResourceStack {
    pub fn new(root: PDFDict) -> Self {
        Self { frames: vec![root] }
    }

    pub fn push(&mut self, resources: PDFDict) {
        self.frames.push(resources);
    }

    /// Pops a scope; the outermost one stays.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Innermost scope.
    pub fn current(&self) -> Option<&PDFDict> {
        self.frames.last()
    }

    /// Resolves `name` in the `category` subdictionary of the nearest scope
    /// that defines it.
    pub fn lookup(&self, store: &dyn ObjectStore, category: &str, name: &str) -> Option<PDFObject> {
        self.frames.iter().rev().find_map(|frame| {
            let group = store.lookup(frame, category);
            let group = group.dict()?;
            let obj = store.lookup(group, name);
            (!obj.is_null()).then_some(obj)
        })
    }

    pub fn xobject(&self, store: &dyn ObjectStore, name: &str) -> Option<PDFObject> {
        self.lookup(store, "XObject", name)
    }

    pub fn font(&self, store: &dyn ObjectStore, name: &str) -> Option<PDFObject> {
        self.lookup(store, "Font", name)
    }

    pub fn color_space(&self, store: &dyn ObjectStore, name: &str) -> Option<PDFObject> {
        self.lookup(store, "ColorSpace", name)
    }

    pub fn pattern(&self, store: &dyn ObjectStore, name: &str) -> Option<PDFObject> {
        self.lookup(store, "Pattern", name)
    }

    pub fn shading(&self, store: &dyn ObjectStore, name: &str) -> Option<PDFObject> {
        self.lookup(store, "Shading", name)
    }

    pub fn ext_gstate(&self, store: &dyn ObjectStore, name: &str) -> Option<PDFObject> {
        self.lookup(store, "ExtGState", name)
    }

    pub fn properties(&self, store: &dyn ObjectStore, name: &str) -> Option<PDFObject> {
        self.lookup(store, "Properties", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemoryStore;
    use crate::model::objects::dict;

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut store = MemoryStore::new();
        let fonts = store.add(PDFObject::Dict(dict([("F1", PDFObject::Int(1))])));
        let page = dict([
            ("Font", PDFObject::Ref(fonts)),
            ("ExtGState", PDFObject::Dict(dict([("G", PDFObject::Int(3))]))),
        ]);
        let mut stack = ResourceStack::new(page);
        stack.push(dict([(
            "Font",
            PDFObject::Dict(dict([("F1", PDFObject::Int(2))])),
        )]));
        assert_eq!(stack.font(&store, "F1"), Some(PDFObject::Int(2)));
        assert_eq!(stack.ext_gstate(&store, "G"), Some(PDFObject::Int(3)));
        stack.pop();
        assert_eq!(stack.font(&store, "F1"), Some(PDFObject::Int(1)));
        stack.pop();
        assert_eq!(stack.depth(), 1);
        assert!(stack.xobject(&store, "X").is_none());
    }
}
