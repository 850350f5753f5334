//! Entity identity model shared by every aggregate.

use std::sync::Arc;

use common::EntityId;

use crate::error::DomainError;

/// Trait for domain events buffered on an entity.
///
/// Events are kept in memory only; they are never persisted with the entity.
pub trait DomainEvent: std::fmt::Debug + Send + Sync {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;
}

/// Identity and event buffer embedded in every entity.
#[derive(Debug, Clone, Default)]
pub struct EntityCore {
    id: EntityId,
    domain_events: Vec<Arc<dyn DomainEvent>>,
}

impl EntityCore {
    /// Creates the core of a transient entity.
    pub fn transient() -> Self {
        Self::default()
    }

    /// Creates the core of an entity that already has an identity.
    pub fn with_id(id: EntityId) -> Self {
        Self {
            id,
            domain_events: Vec::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }
}

/// Trait for entities: objects defined by identity rather than by their attributes.
///
/// Equality between entities is identity equality. Implementors route their
/// `PartialEq` through [`Entity::same_identity_as`], which never considers a
/// transient entity equal to anything, itself included. Comparisons through
/// `Option` then give the expected absent-value semantics: two `None`s are equal
/// and `None` never equals `Some`.
pub trait Entity {
    fn core(&self) -> &EntityCore;

    fn core_mut(&mut self) -> &mut EntityCore;

    /// Returns the entity identifier; nil while transient.
    fn id(&self) -> EntityId {
        self.core().id
    }

    /// Returns true if the entity has not been assigned an identity yet.
    fn is_transient(&self) -> bool {
        self.core().id.is_nil()
    }

    /// Assigns the identity chosen by the store on first persist.
    ///
    /// Identity is set once; assigning to a non-transient entity fails.
    fn assign_id(&mut self, id: EntityId) -> Result<(), DomainError> {
        if !self.is_transient() {
            return Err(DomainError::InvalidOperation(format!(
                "entity {} already has an identity",
                self.id()
            )));
        }
        if id.is_nil() {
            return Err(DomainError::invalid_argument(
                "id",
                "the nil identifier cannot be assigned",
            ));
        }
        self.core_mut().id = id;
        Ok(())
    }

    /// Identity comparison backing `PartialEq` for entities.
    fn same_identity_as(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        !self.is_transient() && !other.is_transient() && self.id() == other.id()
    }

    fn domain_events(&self) -> &[Arc<dyn DomainEvent>] {
        &self.core().domain_events
    }

    fn add_domain_event(&mut self, event: Arc<dyn DomainEvent>) {
        self.core_mut().domain_events.push(event);
    }

    /// Removes a previously added event instance. Unknown events are ignored.
    fn remove_domain_event(&mut self, event: &Arc<dyn DomainEvent>) {
        let events = &mut self.core_mut().domain_events;
        if let Some(position) = events.iter().position(|e| Arc::ptr_eq(e, event)) {
            events.remove(position);
        }
    }

    fn clear_domain_events(&mut self) {
        self.core_mut().domain_events.clear();
    }
}
