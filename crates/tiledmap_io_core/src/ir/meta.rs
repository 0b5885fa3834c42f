//! Properties and components attached to IR nodes.

use crate::attribute::AttributeValue;
use crate::error::TypeMismatch;

/// A property or component slot: a name paired with a typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedAttribute {
    pub name: String,
    pub value: AttributeValue,
}

impl NamedAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

fn find<'a>(attributes: &'a [NamedAttribute], name: &str) -> Option<&'a NamedAttribute> {
    attributes.iter().find(|attr| attr.name == name)
}

/// Inserts or replaces `name`, keeping the position of an existing entry.
fn upsert(
    attributes: &mut Vec<NamedAttribute>,
    name: String,
    value: AttributeValue,
) -> Option<AttributeValue> {
    match attributes.iter_mut().find(|attr| attr.name == name) {
        Some(existing) => Some(std::mem::replace(&mut existing.value, value)),
        None => {
            attributes.push(NamedAttribute { name, value });
            None
        }
    }
}

/// A component prototype: named, typed slots with default values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Component {
    pub name: String,
    pub attributes: Vec<NamedAttribute>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Adds (or replaces) a slot with its default value.
    pub fn with_attribute(mut self, name: impl Into<String>, default: AttributeValue) -> Self {
        upsert(&mut self.attributes, name.into(), default);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        find(&self.attributes, name).map(|attr| &attr.value)
    }

    /// A fresh attachment holding every slot at its default.
    pub fn instantiate(&self) -> AttachedComponent {
        AttachedComponent {
            prototype: self.name.clone(),
            values: self.attributes.clone(),
        }
    }
}

/// A component attached to an IR node. Values are aligned by name to the prototype.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttachedComponent {
    pub prototype: String,
    pub values: Vec<NamedAttribute>,
}

impl AttachedComponent {
    pub fn new(prototype: impl Into<String>) -> Self {
        Self {
            prototype: prototype.into(),
            values: Vec::new(),
        }
    }

    pub fn value(&self, name: &str) -> Option<&AttributeValue> {
        find(&self.values, name).map(|attr| &attr.value)
    }

    /// Updates a slot, which must keep the kind it already has.
    ///
    /// Unknown slots are appended.
    pub fn set_value(
        &mut self,
        name: impl Into<String>,
        value: AttributeValue,
    ) -> Result<(), TypeMismatch> {
        let name = name.into();
        match self.values.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value.set(value),
            None => {
                self.values.push(NamedAttribute { name, value });
                Ok(())
            }
        }
    }

    /// Rebuilds the values in prototype order.
    ///
    /// Slots missing here, or stored with a different kind, take the prototype
    /// default. Slots the prototype does not declare are dropped.
    pub fn align_to(&mut self, prototype: &Component) {
        let aligned = prototype
            .attributes
            .iter()
            .map(|slot| match self.value(&slot.name) {
                Some(value) if value.kind() == slot.value.kind() => NamedAttribute {
                    name: slot.name.clone(),
                    value: value.clone(),
                },
                _ => slot.clone(),
            })
            .collect();
        self.values = aligned;
    }
}

/// Name, properties and components owned by one IR node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    pub name: String,
    pub properties: Vec<NamedAttribute>,
    pub components: Vec<AttachedComponent>,
}

impl Metadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn property(&self, name: &str) -> Option<&AttributeValue> {
        find(&self.properties, name).map(|attr| &attr.value)
    }

    /// Sets a property, returning the previous value if the name was taken.
    ///
    /// Names stay unique and the original insertion position is kept.
    pub fn set_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        upsert(&mut self.properties, name.into(), value.into())
    }

    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.set_property(name, value);
        self
    }

    pub fn component(&self, prototype: &str) -> Option<&AttachedComponent> {
        self.components.iter().find(|c| c.prototype == prototype)
    }

    /// Attaches a component, replacing an existing attachment of the same prototype.
    pub fn attach(&mut self, component: AttachedComponent) {
        match self
            .components
            .iter_mut()
            .find(|c| c.prototype == component.prototype)
        {
            Some(existing) => *existing = component,
            None => self.components.push(component),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.properties.is_empty() && self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeKind;
    use crate::color::Color;

    #[test]
    fn test_set_property_keeps_order_and_uniqueness() {
        let mut meta = Metadata::named("layer");
        meta.set_property("b", 1);
        meta.set_property("a", "x");
        let previous = meta.set_property("b", 2);

        assert_eq!(previous, Some(AttributeValue::Int(1)));
        let names: Vec<_> = meta.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(meta.property("b"), Some(&AttributeValue::Int(2)));
    }

    #[test]
    fn test_attached_component_kind_checked() {
        let prototype = Component::new("Health").with_attribute("hp", AttributeValue::Int(10));
        let mut attached = prototype.instantiate();

        attached.set_value("hp", AttributeValue::Int(3)).unwrap();
        let err = attached
            .set_value("hp", AttributeValue::Bool(true))
            .unwrap_err();
        assert_eq!(err.expected, AttributeKind::Int);
        assert_eq!(attached.value("hp"), Some(&AttributeValue::Int(3)));
    }

    #[test]
    fn test_align_to_fills_defaults_and_drops_unknown() {
        let prototype = Component::new("Light")
            .with_attribute("color", AttributeValue::Color(Color::WHITE))
            .with_attribute("radius", AttributeValue::Float(4.0));

        let mut attached = AttachedComponent::new("Light");
        attached.values.push(NamedAttribute::new("radius", 8.0_f32));
        attached.values.push(NamedAttribute::new("stale", true));
        attached.align_to(&prototype);

        assert_eq!(
            attached.values,
            vec![
                NamedAttribute::new("color", Color::WHITE),
                NamedAttribute::new("radius", 8.0_f32),
            ]
        );
    }

    #[test]
    fn test_attach_replaces_same_prototype() {
        let mut meta = Metadata::default();
        meta.attach(AttachedComponent::new("A"));
        let mut replacement = AttachedComponent::new("A");
        replacement.values.push(NamedAttribute::new("x", 1));
        meta.attach(replacement.clone());

        assert_eq!(meta.components, vec![replacement]);
    }
}
