// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{
    BufferedValue,
    commit::{ApplyReport, Visiting},
};
use crate::{
    factory::{self, ElementKind},
    host::{List, Value},
};
use std::{cell::RefCell, fmt, rc::Rc};

struct SequenceState {
    content: List,
    elements: Vec<BufferedValue>,
    element_kind: ElementKind,
}

/// A buffered view of a [`List`].
///
/// Every element is wrapped individually when the sequence proxy is created, so objects in the
/// list get their own [`BufferedProxy`](super::BufferedProxy). Structural edits (`push`,
/// `insert`, `remove`) only change the proxy's element list. Applying the owning proxy commits
/// every element and stores a new list built from the elements' content.
#[derive(Clone)]
pub struct SequenceProxy(Rc<RefCell<SequenceState>>);

impl SequenceProxy {
    pub(crate) fn new(content: List) -> Self {
        let element_kind = ElementKind::of_first(&content);
        let elements = content
            .to_vec()
            .into_iter()
            .map(|element| factory::proxify(element.into()))
            .collect();
        Self(Rc::new(RefCell::new(SequenceState {
            content,
            elements,
            element_kind,
        })))
    }

    /// The list this proxy currently stands for.
    ///
    /// This is replaced by the freshly built list whenever the sequence is committed.
    pub fn content(&self) -> List {
        self.0.borrow().content.clone()
    }

    /// The kind of the first element at the time the sequence was wrapped.
    pub fn element_kind(&self) -> ElementKind {
        self.0.borrow().element_kind.clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<BufferedValue> {
        self.0.borrow().elements.get(index).cloned()
    }

    pub fn elements(&self) -> Vec<BufferedValue> {
        self.0.borrow().elements.clone()
    }

    /// Appends `value`, wrapping it if it is structured.
    pub fn push(&self, value: impl Into<BufferedValue>) {
        let value = factory::proxify(value.into());
        self.0.borrow_mut().elements.push(value);
    }

    /// Inserts `value` at `index`, wrapping it if it is structured.
    ///
    /// Returns false, and leaves the sequence alone, if `index` is past the end.
    pub fn insert(&self, index: usize, value: impl Into<BufferedValue>) -> bool {
        let mut state = self.0.borrow_mut();
        if index > state.elements.len() {
            return false;
        }
        state.elements.insert(index, factory::proxify(value.into()));
        true
    }

    pub fn remove(&self, index: usize) -> Option<BufferedValue> {
        let mut state = self.0.borrow_mut();
        (index < state.elements.len()).then(|| state.elements.remove(index))
    }

    /// Returns true if an element proxy has pending changes, or if the elements no longer
    /// match the wrapped list.
    pub fn has_changes(&self) -> bool {
        self.has_changes_guarded(&mut Visiting::default())
    }

    pub(crate) fn has_changes_guarded(&self, visiting: &mut Visiting) -> bool {
        if !visiting.enter(self.id()) {
            return false;
        }
        let (content, elements) = {
            let state = self.0.borrow();
            (state.content.to_vec(), state.elements.clone())
        };
        let changed = content.len() != elements.len()
            || elements.iter().zip(&content).any(|(element, original)| {
                element.content_value() != *original
                    || match element {
                        BufferedValue::Proxy(proxy) => proxy.has_deep_changes_guarded(visiting),
                        BufferedValue::Sequence(sequence) => {
                            sequence.has_changes_guarded(visiting)
                        }
                        BufferedValue::Value(_) => false,
                    }
            });
        visiting.leave(self.id());
        changed
    }

    pub fn ptr_eq(&self, other: &SequenceProxy) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Applies every element and returns the list to store in place of the wrapped one.
    ///
    /// Element keys are reported below `path` by index.
    pub(crate) fn commit(
        &self,
        path: &str,
        visiting: &mut Visiting,
        report: &mut ApplyReport,
    ) -> List {
        if !visiting.enter(self.id()) {
            return self.content();
        }
        let elements = self.elements();
        let mut committed = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let value = match element {
                BufferedValue::Value(value) => value.clone(),
                BufferedValue::Proxy(proxy) => {
                    let nested = proxy.apply_guarded(None, visiting);
                    report.absorb(&format!("{path}.{index}"), nested);
                    proxy.content().into()
                }
                BufferedValue::Sequence(sequence) => {
                    Value::List(sequence.commit(&format!("{path}.{index}"), visiting, report))
                }
            };
            committed.push(value);
        }

        let list: List = committed.into_iter().collect();
        self.0.borrow_mut().content = list.clone();
        visiting.leave(self.id());
        list
    }

    /// Discards pending changes of every element proxy.
    ///
    /// Structural edits are not undone: the sequence proxy itself is dropped by its owner.
    pub(crate) fn discard(&self, visiting: &mut Visiting) {
        if !visiting.enter(self.id()) {
            return;
        }
        for element in self.elements() {
            match element {
                BufferedValue::Proxy(proxy) => proxy.discard_guarded(None, visiting),
                BufferedValue::Sequence(sequence) => sequence.discard(visiting),
                BufferedValue::Value(_) => {}
            }
        }
        visiting.leave(self.id());
    }
}

impl fmt::Debug for SequenceProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(state) => f
                .debug_struct("SequenceProxy")
                .field("kind", &state.element_kind)
                .field("len", &state.elements.len())
                .finish(),
            Err(_) => f.write_str("SequenceProxy { <borrowed> }"),
        }
    }
}
