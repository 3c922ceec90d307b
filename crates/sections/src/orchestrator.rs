use std::cell::RefCell;
use std::rc::Rc;

use foundation::SectionId;
use futures_util::future::join_all;
use runtime::{DiagnosticKind, Diagnostics};

use crate::config::OrchestratorOptions;
use crate::descriptor::{
    LoadError, MountError, SectionControl, SectionDescriptor, SectionHandle, SectionModule,
};
use crate::host::{SECTION_ID_ATTRIBUTE, TargetResolver, VisibilityEntry, VisibilityObserver};
use crate::registry::{ClaimTicket, LoadedSection, Registry};

/// Page services the orchestrator depends on.
#[derive(Clone)]
pub struct OrchestratorHost {
    pub resolver: Rc<dyn TargetResolver>,
    pub observer: Rc<dyn VisibilityObserver>,
    pub diagnostics: Diagnostics,
}

struct Inner {
    options: OrchestratorOptions,
    host: OrchestratorHost,
    registry: RefCell<Registry>,
}

/// Lazily loads and mounts page sections as they approach the viewport.
///
/// Cloning is cheap and yields another handle onto the same orchestrator, so
/// visibility callbacks can own one while the page keeps another.
///
/// Every failure (missing target, loader error, mount or unmount error) is
/// reported through [`Diagnostics`]; nothing propagates to the caller.
#[derive(Clone)]
pub struct ScrollySections {
    inner: Rc<Inner>,
}

impl ScrollySections {
    pub fn new(options: OrchestratorOptions, host: OrchestratorHost) -> Self {
        host.diagnostics.set_debug(options.debug);
        Self {
            inner: Rc::new(Inner {
                options,
                host,
                registry: RefCell::new(Registry::new()),
            }),
        }
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.inner.options
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.inner.host.diagnostics
    }

    pub fn init(&self, sections: Vec<SectionDescriptor>) {
        self.diagnostics().info(
            None,
            format!(
                "initializing {} section(s), preload margin {}",
                sections.len(),
                self.inner.options.preload_margin
            ),
        );
        self.register(sections);
    }

    pub fn register(&self, descriptors: Vec<SectionDescriptor>) {
        for descriptor in descriptors {
            self.register_one(descriptor);
        }
    }

    /// Registers one more section after `init`.
    pub fn add_section(&self, descriptor: SectionDescriptor) {
        self.register_one(descriptor);
    }

    fn register_one(&self, descriptor: SectionDescriptor) {
        let id = descriptor.id.clone();
        let target = descriptor.target.clone();
        let inserted = self.inner.registry.borrow_mut().insert(descriptor);
        if !inserted {
            self.diagnostics().report(
                DiagnosticKind::InvalidDescriptor,
                Some(&id),
                "duplicate section id; keeping the first registration",
            );
            return;
        }

        let Some(element) = self.inner.host.resolver.resolve(&target) else {
            self.diagnostics().report(
                DiagnosticKind::TargetNotFound,
                Some(&id),
                format!("target {target} not found; section will not load on scroll"),
            );
            return;
        };

        element.set_data_attribute(SECTION_ID_ATTRIBUTE, id.as_str());
        self.inner
            .host
            .observer
            .observe(Rc::clone(&element), &self.inner.options.preload_margin);
        self.diagnostics()
            .info(Some(&id), format!("observing {}", element.describe()));
        self.inner.registry.borrow_mut().set_observed(id, element);
    }

    /// Registered ids in registration order.
    pub fn sections(&self) -> Vec<SectionId> {
        self.inner.registry.borrow().ids()
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.inner.registry.borrow().is_loaded(id)
    }

    pub fn is_observed(&self, id: &str) -> bool {
        self.inner.registry.borrow().is_observed(id)
    }

    pub fn loaded_count(&self) -> usize {
        self.inner.registry.borrow().loaded_count()
    }

    pub fn handle(&self, id: &str) -> Option<Rc<dyn SectionHandle>> {
        self.inner
            .registry
            .borrow()
            .loaded(id)
            .map(|l| Rc::clone(&l.handle))
    }

    /// Loads every section whose marked target entered the preload zone.
    pub async fn handle_entries(&self, entries: Vec<VisibilityEntry>) {
        let ids: Vec<SectionId> = entries
            .iter()
            .filter(|e| e.is_intersecting)
            .filter_map(|e| e.target.data_attribute(SECTION_ID_ATTRIBUTE))
            .map(SectionId::from)
            .collect();
        join_all(ids.iter().map(|id| self.load_section(id.as_str()))).await;
    }

    /// Loads and mounts `id` once. Unknown, in-flight and loaded ids are
    /// ignored, so repeated visibility events are harmless.
    pub async fn load_section(&self, id: &str) {
        // Claimed before the first await; concurrent callers see the claim.
        let Some((ticket, descriptor)) = self.claim(id) else {
            return;
        };
        let id = descriptor.id.clone();
        self.diagnostics().info(Some(&id), "loading section");

        let module = match self.resolve_module(&descriptor).await {
            Ok(module) => module,
            Err(err) => return self.fail_load(&id, ticket, err),
        };
        if !self.inner.registry.borrow().holds_claim(id.as_str(), ticket) {
            self.diagnostics()
                .info(Some(&id), "orchestrator destroyed before mount; skipping");
            return;
        }

        let handle = module.create_section();
        if let Err(err) = handle.mount(descriptor.mount_options()).await {
            return self.fail_load(&id, ticket, LoadError::Mount(err));
        }

        let completed = self
            .inner
            .registry
            .borrow_mut()
            .complete(id.as_str(), ticket, LoadedSection { module, handle });
        match completed {
            Ok(()) => {
                self.stop_observing(&id);
                self.diagnostics().info(Some(&id), "section mounted");
            }
            Err(orphan) => {
                // destroy() ran while mounting; nobody else will unmount it.
                if let Err(err) = orphan.handle.unmount().await {
                    self.diagnostics().report(
                        DiagnosticKind::UnmountFailure,
                        Some(&id),
                        err.to_string(),
                    );
                }
            }
        }
    }

    fn claim(&self, id: &str) -> Option<(ClaimTicket, SectionDescriptor)> {
        let mut registry = self.inner.registry.borrow_mut();
        let ticket = registry.try_claim(id)?;
        let descriptor = registry.descriptor(id)?.clone();
        Some((ticket, descriptor))
    }

    async fn resolve_module(
        &self,
        descriptor: &SectionDescriptor,
    ) -> Result<Rc<dyn SectionModule>, LoadError> {
        let source = descriptor
            .module
            .as_ref()
            .ok_or(LoadError::MissingImplementation)?;
        source.resolve().await
    }

    fn fail_load(&self, id: &SectionId, ticket: ClaimTicket, err: LoadError) {
        self.inner.registry.borrow_mut().release(id.as_str(), ticket);
        let kind = match &err {
            LoadError::Mount(MountError::TargetNotFound(_)) => DiagnosticKind::TargetNotFound,
            _ => DiagnosticKind::LoadFailure,
        };
        self.diagnostics().report(kind, Some(id), err.to_string());
        // No automatic retry; an explicit load_section call may still succeed.
        self.stop_observing(id);
    }

    fn stop_observing(&self, id: &SectionId) {
        let target = self.inner.registry.borrow_mut().take_observed(id.as_str());
        if let Some(target) = target {
            target.remove_data_attribute(SECTION_ID_ATTRIBUTE);
            self.inner.host.observer.unobserve(&target);
        }
    }

    /// Forwards a user control to a loaded section. `false` if `id` is not
    /// loaded.
    pub async fn control(&self, id: &str, control: SectionControl) -> bool {
        let Some(handle) = self.handle(id) else {
            return false;
        };
        handle.control(control).await;
        true
    }

    /// Stops observation, forgets every section and unmounts the loaded ones.
    /// One failing unmount does not keep the others mounted.
    pub async fn destroy(&self) {
        let (loaded, observed) = self.inner.registry.borrow_mut().clear();
        for target in &observed {
            target.remove_data_attribute(SECTION_ID_ATTRIBUTE);
            self.inner.host.observer.unobserve(target);
        }
        self.inner.host.observer.disconnect();

        let total = loaded.len();
        let mut failed = 0usize;
        for (id, section) in loaded {
            if let Err(err) = section.handle.unmount().await {
                failed += 1;
                self.diagnostics().report(
                    DiagnosticKind::UnmountFailure,
                    Some(&id),
                    err.to_string(),
                );
            }
        }
        self.diagnostics().info(
            None,
            format!("destroyed {total} loaded section(s), {failed} with unmount errors"),
        );
    }
}

impl std::fmt::Debug for ScrollySections {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollySections")
            .field("options", &self.inner.options)
            .field("sections", &self.sections())
            .finish()
    }
}
