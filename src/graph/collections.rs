//! Collections graph builder.
//!
//! Builds one independent object graph per managed element of a top-level
//! container. The container itself is not a node: elements are addressed
//! below a synthetic wrapper owner (`ListWrapper/#list/0`), so value objects
//! in the container get stable, position-based identities.

use crate::error::{GraphError, GraphResult};
use crate::metamodel::{Enumerable, EnumerableType, EnumeratorContext, ManagedType, OwnerContext};
use crate::normalize::{ContainerWrapper, NormalizedContainer};
use crate::types::{ContainerShape, GlobalId, ObjectRef, PositionKey, TypeName, Value};

use super::builder::ObjectGraphBuilder;
use super::live::{CollectionElement, CollectionsGraph, LiveGraph};

/// Builds collections graphs from normalized containers.
#[derive(Clone)]
pub struct CollectionsGraphBuilder {
    objects: ObjectGraphBuilder,
}

impl CollectionsGraphBuilder {
    /// Create a builder that builds element graphs with `objects`.
    pub fn new(objects: ObjectGraphBuilder) -> Self {
        Self { objects }
    }

    /// Build the collections graph of a container.
    ///
    /// When `element_class` names an Entity or ValueObject, object elements
    /// are handled as that class; otherwise each element is classified by
    /// its runtime class. Elements that are not managed are kept as values.
    pub fn build_graph(
        &self,
        container: &NormalizedContainer,
        element_class: Option<&TypeName>,
    ) -> GraphResult<CollectionsGraph> {
        let declared = element_class
            .map(|class| self.objects.mapper().classify_class(class))
            .filter(|managed| managed.managed_class().is_some());

        tracing::debug!(
            wrapper = container.wrapper_type(),
            len = container.len(),
            element_class = ?element_class.map(TypeName::as_str),
            "Building collections graph"
        );

        let source = container.as_value();
        let descriptor = EnumerableType::for_value(&source)
            .ok_or_else(|| GraphError::invalid(format!("{} is not a container", source.kind_name())))?;
        let mut ctx = OwnerContext::new(
            GlobalId::unbound(container.wrapper_type()),
            container.shape().to_string(),
        );

        let mut elements = Vec::with_capacity(container.len());
        let state = descriptor.transform(
            &source,
            |element, ctx| {
                let position = ctx.position().unwrap_or(PositionKey::Member);
                match self.element_graph(element, declared.as_ref(), ctx)? {
                    Some(graph) => {
                        let reference = Value::Ref(graph.root_node().global_id().clone());
                        elements.push((position, CollectionElement::Graph(graph)));
                        Ok(reference)
                    }
                    None => {
                        // Plain map keys are already carried by the value positions.
                        if !matches!(ctx.enumerator(), EnumeratorContext::MapKey { .. }) {
                            elements.push((position, CollectionElement::Value(element.clone())));
                        }
                        Ok(element.clone())
                    }
                }
            },
            &mut ctx,
        )?;

        if matches!(container.shape(), ContainerShape::Set | ContainerShape::Map) {
            elements.sort_by_cached_key(|(position, element)| element_order(position, element));
        }

        let graph = CollectionsGraph::new(
            container.shape(),
            container.wrapper_type(),
            element_class.cloned(),
            elements,
            state,
        );
        tracing::debug!(
            wrapper = graph.wrapper_type(),
            elements = graph.len(),
            graphs = graph.graphs().count(),
            "Collections graph built"
        );
        Ok(graph)
    }

    fn element_graph(
        &self,
        element: &Value,
        declared: Option<&ManagedType>,
        ctx: &OwnerContext,
    ) -> GraphResult<Option<LiveGraph>> {
        let object: &ObjectRef = match element.as_object() {
            Some(object) => object,
            None => return Ok(None),
        };
        let managed = match declared {
            Some(managed) => managed.clone(),
            None => match self.objects.managed_type_of(object) {
                Some(managed) => managed,
                None => return Ok(None),
            },
        };
        self.objects.build_from(object, managed, Some(ctx)).map(Some)
    }
}

/// Sort key for elements of unordered containers, independent of where
/// the elements live in memory.
fn element_order(position: &PositionKey, element: &CollectionElement) -> (String, String) {
    let position = match position {
        PositionKey::Key(key) => key.path_fragment(),
        other => other.to_string(),
    };
    let element = match element {
        CollectionElement::Graph(graph) => graph.root_node().global_id().to_string(),
        CollectionElement::Value(value) => value.path_fragment(),
    };
    (position, element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cdo::LiveCdoFactory;
    use crate::metamodel::{InMemoryTypeRegistry, ManagedClass};
    use crate::normalize::normalize;
    use crate::types::TypeSignature;

    fn builder() -> CollectionsGraphBuilder {
        let mut registry = InMemoryTypeRegistry::new();
        registry
            .register_entity(
                ManagedClass::new("Customer")
                    .with_id_property("id")
                    .with_property("id", TypeSignature::class("long")),
            )
            .register_value_object(ManagedClass::new("Address"));
        let objects = ObjectGraphBuilder::new(Arc::new(registry), Arc::new(LiveCdoFactory::new()));
        CollectionsGraphBuilder::new(objects)
    }

    fn container(value: &Value) -> NormalizedContainer {
        normalize(value).unwrap().as_container().unwrap().clone()
    }

    #[test]
    fn test_list_of_entities() {
        let list = Value::list([
            Value::from(ObjectRef::new("Customer").with("id", 1)),
            Value::from(ObjectRef::new("Customer").with("id", 2)),
        ]);
        let graph = builder().build_graph(&container(&list), None).unwrap();

        assert_eq!(graph.wrapper_type(), "ListWrapper");
        assert_eq!(graph.len(), 2);
        let roots: Vec<_> = graph
            .graphs()
            .map(|(position, g)| (position.clone(), g.root_node().global_id().to_string()))
            .collect();
        assert_eq!(
            roots,
            vec![
                (PositionKey::Index(0), "Customer/1".to_string()),
                (PositionKey::Index(1), "Customer/2".to_string()),
            ]
        );
    }

    #[test]
    fn test_value_objects_addressed_below_wrapper() {
        let list = Value::list([Value::from(ObjectRef::new("Address"))]);
        let graph = builder().build_graph(&container(&list), None).unwrap();

        let (_, element) = graph.graphs().next().unwrap();
        assert_eq!(element.root_node().global_id().to_string(), "ListWrapper/#list/0");
    }

    #[test]
    fn test_map_values_tagged_by_key() {
        let map = Value::map([
            (Value::str("a"), Value::from(ObjectRef::new("Customer").with("id", 1))),
            (Value::str("b"), Value::Int(5)),
        ]);
        let graph = builder().build_graph(&container(&map), None).unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.elements()[0].0, PositionKey::Key(Value::str("a")));
        assert!(graph.elements()[0].1.as_graph().is_some());
        assert_eq!(graph.elements()[1].0, PositionKey::Key(Value::str("b")));
        assert_eq!(graph.elements()[1].1.as_value(), Some(&Value::Int(5)));
        assert_eq!(
            graph.state(),
            &Value::map([
                (Value::str("a"), Value::Ref(GlobalId::instance("Customer", 1))),
                (Value::str("b"), Value::Int(5)),
            ])
        );
    }

    #[test]
    fn test_declared_element_class_overrides_runtime() {
        let list = Value::list([Value::from(ObjectRef::new("Unregistered").with("id", 3))]);
        let graph = builder()
            .build_graph(&container(&list), Some(&TypeName::new("Customer")))
            .unwrap();

        let (_, element) = graph.graphs().next().unwrap();
        assert_eq!(element.root_node().global_id(), &GlobalId::instance("Customer", 3));
        assert_eq!(graph.element_class(), Some(&TypeName::new("Customer")));
    }

    #[test]
    fn test_set_elements_ordered_by_content() {
        let address = |city: &str| Value::from(ObjectRef::new("Address").with("city", city));
        let build = |first: &str, second: &str| {
            let set = Value::set([address(first), address(second)]);
            builder().build_graph(&container(&set), None).unwrap()
        };

        let roots = |graph: &CollectionsGraph| -> Vec<String> {
            graph
                .graphs()
                .map(|(position, g)| {
                    assert_eq!(position, &PositionKey::Member);
                    g.root_node().global_id().to_string()
                })
                .collect()
        };
        let forward = build("Lyon", "Oslo");
        let backward = build("Oslo", "Lyon");
        assert_eq!(roots(&forward), roots(&backward));
        assert_eq!(forward.state(), backward.state());
        assert!(roots(&forward).iter().all(|id| id.starts_with("SetWrapper/#set/#")));
    }

    #[test]
    fn test_primitive_array_kept_as_values() {
        let array = Value::int_array([1, 2]);
        let graph = builder().build_graph(&container(&array), None).unwrap();
        assert_eq!(graph.graphs().count(), 0);
        assert_eq!(graph.elements()[1].0, PositionKey::Index(1));
        assert_eq!(graph.elements()[1].1.as_value(), Some(&Value::Int(2)));
    }
}
