//! Cdo factories: turning a live domain object into a graph node identity.
//!
//! ## Identity Rules
//!
//! | Category | Owner context | GlobalId |
//! |----------|---------------|----------|
//! | Entity | ignored | `Type/id` |
//! | ValueObject | present | `Owner#path` |
//! | ValueObject | absent | `Type/` |

use crate::error::{GraphError, GraphResult};
use crate::metamodel::{ManagedType, OwnerContext};
use crate::types::{Cdo, GlobalId, LocalId, ObjectRef};

/// Creates Cdos for managed objects.
///
/// Implementations must be pure functions of their inputs: two calls with
/// the same object, classification and context yield equal identities.
pub trait CdoFactory: Send + Sync {
    /// Create the Cdo for `object` classified as `managed`.
    ///
    /// `owner` is the context the object was reached through, absent for roots.
    fn create(
        &self,
        object: &ObjectRef,
        managed: &ManagedType,
        owner: Option<&OwnerContext>,
    ) -> GraphResult<Cdo>;
}

/// Default factory: wraps the live object, identity from the id property
/// or from the owner path.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveCdoFactory;

impl LiveCdoFactory {
    /// Create a new factory.
    pub fn new() -> Self {
        Self
    }
}

impl CdoFactory for LiveCdoFactory {
    fn create(
        &self,
        object: &ObjectRef,
        managed: &ManagedType,
        owner: Option<&OwnerContext>,
    ) -> GraphResult<Cdo> {
        let global_id = match managed {
            ManagedType::Entity(class) => {
                let id_property = class.id_property().ok_or_else(|| {
                    GraphError::invalid(format!("entity {} has no id property", class.type_name()))
                })?;
                let id = object.get(id_property);
                let local_id = LocalId::from_value(&id).ok_or_else(|| {
                    GraphError::invalid(format!(
                        "entity {} has {} id in property '{}'",
                        class.type_name(),
                        id.kind_name(),
                        id_property
                    ))
                })?;
                GlobalId::instance(class.type_name().clone(), local_id)
            }
            ManagedType::ValueObject(class) => match owner {
                Some(ctx) => GlobalId::value_object(ctx.owner().clone(), ctx.path()),
                None => GlobalId::unbound(class.type_name().clone()),
            },
            _ => return Err(GraphError::not_managed(object.type_name())),
        };

        Ok(Cdo::new(global_id, object.type_name().clone(), object.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::{EnumeratorContext, ManagedClass};
    use crate::types::TypeName;

    fn customer_class() -> ManagedType {
        ManagedType::Entity(ManagedClass::new("Customer").with_id_property("id"))
    }

    #[test]
    fn test_entity_identity_from_id_property() {
        let factory = LiveCdoFactory::new();
        let customer = ObjectRef::new("Customer").with("id", 1);

        let cdo = factory.create(&customer, &customer_class(), None).unwrap();
        assert_eq!(cdo.global_id().to_string(), "Customer/1");
        assert!(cdo.wrapped().unwrap().ptr_eq(&customer));

        let ctx = OwnerContext::new(GlobalId::instance("Shop", 9), "customers");
        let owned = factory.create(&customer, &customer_class(), Some(&ctx)).unwrap();
        assert_eq!(owned.global_id(), cdo.global_id());
    }

    #[test]
    fn test_entity_id_kind_is_part_of_identity() {
        let factory = LiveCdoFactory::new();
        let numeric = ObjectRef::new("Customer").with("id", 1);
        let textual = ObjectRef::new("Customer").with("id", "1");

        let a = factory.create(&numeric, &customer_class(), None).unwrap();
        let b = factory.create(&textual, &customer_class(), None).unwrap();
        assert_ne!(a.global_id(), b.global_id());
        assert_eq!(a.global_id(), &GlobalId::instance("Customer", 1));
        assert_eq!(b.global_id(), &GlobalId::instance("Customer", "1"));
    }

    #[test]
    fn test_entity_without_id_rejected() {
        let factory = LiveCdoFactory::new();
        let customer = ObjectRef::new("Customer");
        let err = factory.create(&customer, &customer_class(), None).unwrap_err();
        assert!(matches!(err, GraphError::InvalidArgument(_)));

        let bare = ManagedType::Entity(ManagedClass::new("Customer"));
        assert!(factory.create(&customer, &bare, None).is_err());
    }

    #[test]
    fn test_value_object_identity_from_owner_path() {
        let factory = LiveCdoFactory::new();
        let address = ObjectRef::new("Address").with("city", "Paris");
        let managed = ManagedType::ValueObject(ManagedClass::new("Address"));

        let mut ctx = OwnerContext::new(GlobalId::instance("Customer", 1), "address");
        let cdo = factory.create(&address, &managed, Some(&ctx)).unwrap();
        assert_eq!(cdo.global_id().to_string(), "Customer/1#address");

        ctx.set_enumerator(EnumeratorContext::Index(0));
        let cdo = factory.create(&address, &managed, Some(&ctx)).unwrap();
        assert_eq!(cdo.global_id().to_string(), "Customer/1#address/0");

        let unbound = factory.create(&address, &managed, None).unwrap();
        assert_eq!(unbound.global_id(), &GlobalId::unbound("Address"));
        assert_eq!(unbound.type_name(), &TypeName::new("Address"));
    }

    #[test]
    fn test_non_managed_rejected() {
        let factory = LiveCdoFactory::new();
        let object = ObjectRef::new("Money");
        let err = factory
            .create(&object, &ManagedType::Value(TypeName::new("Money")), None)
            .unwrap_err();
        assert_eq!(err, GraphError::not_managed("Money"));
    }
}
