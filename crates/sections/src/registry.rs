use std::collections::HashMap;
use std::rc::Rc;

use foundation::SectionId;

use crate::descriptor::{SectionDescriptor, SectionHandle, SectionModule};
use crate::host::TargetElement;

/// Proof that a caller owns the in-flight load of one id.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClaimTicket(u64);

#[derive(Clone)]
pub struct LoadedSection {
    pub module: Rc<dyn SectionModule>,
    pub handle: Rc<dyn SectionHandle>,
}

enum LoadSlot {
    Claimed(ClaimTicket),
    Loaded(LoadedSection),
}

/// Descriptor and load bookkeeping for the orchestrator.
///
/// Invariants:
/// - a slot exists only for a registered id;
/// - an id is `Claimed` from the moment its load starts until it either
///   completes (`Loaded`) or fails (slot removed);
/// - `Loaded` is entered at most once per registration.
#[derive(Default)]
pub struct Registry {
    order: Vec<SectionId>,
    descriptors: HashMap<SectionId, SectionDescriptor>,
    slots: HashMap<SectionId, LoadSlot>,
    observed: HashMap<SectionId, Rc<dyn TargetElement>>,
    next_ticket: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` (and keeps the existing entry) on a duplicate id.
    pub fn insert(&mut self, descriptor: SectionDescriptor) -> bool {
        if self.descriptors.contains_key(&descriptor.id) {
            return false;
        }
        self.order.push(descriptor.id.clone());
        self.descriptors.insert(descriptor.id.clone(), descriptor);
        true
    }

    pub fn descriptor(&self, id: &str) -> Option<&SectionDescriptor> {
        self.descriptors.get(id)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<SectionId> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Claims `id` for loading. `None` if unknown, already claimed or loaded.
    pub fn try_claim(&mut self, id: &str) -> Option<ClaimTicket> {
        let (key, _) = self.descriptors.get_key_value(id)?;
        if self.slots.contains_key(id) {
            return None;
        }
        let ticket = ClaimTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.slots.insert(key.clone(), LoadSlot::Claimed(ticket));
        Some(ticket)
    }

    pub fn holds_claim(&self, id: &str, ticket: ClaimTicket) -> bool {
        matches!(self.slots.get(id), Some(LoadSlot::Claimed(t)) if *t == ticket)
    }

    /// Turns a live claim into a loaded entry. Hands the section back if the
    /// claim was dropped in the meantime.
    pub fn complete(
        &mut self,
        id: &str,
        ticket: ClaimTicket,
        loaded: LoadedSection,
    ) -> Result<(), LoadedSection> {
        match self.slots.get_mut(id) {
            Some(slot) if matches!(&*slot, LoadSlot::Claimed(t) if *t == ticket) => {
                *slot = LoadSlot::Loaded(loaded);
                Ok(())
            }
            _ => Err(loaded),
        }
    }

    /// Drops a claim after a failed load.
    pub fn release(&mut self, id: &str, ticket: ClaimTicket) {
        if self.holds_claim(id, ticket) {
            self.slots.remove(id);
        }
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        matches!(self.slots.get(id), Some(LoadSlot::Loaded(_)))
    }

    pub fn loaded_count(&self) -> usize {
        self.slots
            .values()
            .filter(|s| matches!(s, LoadSlot::Loaded(_)))
            .count()
    }

    pub fn loaded(&self, id: &str) -> Option<&LoadedSection> {
        match self.slots.get(id) {
            Some(LoadSlot::Loaded(l)) => Some(l),
            _ => None,
        }
    }

    pub fn set_observed(&mut self, id: SectionId, target: Rc<dyn TargetElement>) {
        self.observed.insert(id, target);
    }

    pub fn is_observed(&self, id: &str) -> bool {
        self.observed.contains_key(id)
    }

    pub fn take_observed(&mut self, id: &str) -> Option<Rc<dyn TargetElement>> {
        self.observed.remove(id)
    }

    /// Empties the registry, returning loaded sections (registration order)
    /// and every still-observed target.
    pub fn clear(&mut self) -> (Vec<(SectionId, LoadedSection)>, Vec<Rc<dyn TargetElement>>) {
        let mut loaded = Vec::new();
        for id in self.order.drain(..) {
            if let Some(LoadSlot::Loaded(section)) = self.slots.remove(&id) {
                loaded.push((id, section));
            }
        }
        let observed = self.observed.drain().map(|(_, t)| t).collect();
        self.slots.clear();
        self.descriptors.clear();
        (loaded, observed)
    }
}
