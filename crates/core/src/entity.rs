//! Entity bindings — the startup-built adapter between the mapper and the
//! application's entity types.
//!
//! Each entity type is described once by an [`EntityBinding`]: how to construct
//! it, which setter methods it exposes, and which fields it has (with their
//! visibility). Setters are typed closures, erased behind [`Writer`] so the
//! mapper can drive them by name. Instances travel as [`EntityInstance`], a
//! type-erased box that remembers its binding.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::{AssignmentError, ResolveError};
use crate::value::Payload;

/// An erased member writer.
pub type Writer =
    Arc<dyn Fn(&mut (dyn Any + Send), Payload) -> Result<(), AssignmentError> + Send + Sync>;

type Constructor = Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

/// Who may write a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// The access level an instance is currently held at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Access {
    /// Only public fields are writable.
    #[default]
    Restricted,
    /// Every field is writable. Granted only through [`EntityInstance::elevate`].
    Privileged,
}

struct FieldSlot {
    visibility: Visibility,
    writer: Writer,
}

/// Describes one entity type to the mapper.
pub struct EntityBinding {
    type_name: String,
    type_id: TypeId,
    constructor: Option<Constructor>,
    methods: HashMap<String, Writer>,
    fields: HashMap<String, FieldSlot>,
}

impl EntityBinding {
    /// Start describing the Rust type `T` under the entity name `type_name`.
    pub fn builder<T: Any + Send>(type_name: impl Into<String>) -> BindingBuilder<T> {
        BindingBuilder {
            binding: EntityBinding {
                type_name: type_name.into(),
                type_id: TypeId::of::<T>(),
                constructor: None,
                methods: HashMap::new(),
                fields: HashMap::new(),
            },
            _marker: std::marker::PhantomData,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_constructible(&self) -> bool {
        self.constructor.is_some()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Visibility of a field, or `None` if the type has no such field.
    pub fn field_visibility(&self, name: &str) -> Option<Visibility> {
        self.fields.get(name).map(|slot| slot.visibility)
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered field names, sorted.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct a bare instance, if the binding has a constructor.
    pub fn construct(self: &Arc<Self>) -> Option<EntityInstance> {
        self.constructor.as_ref().map(|ctor| EntityInstance {
            binding: Arc::clone(self),
            inner: ctor(),
            access: Access::default(),
        })
    }
}

impl fmt::Debug for EntityBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityBinding")
            .field("type_name", &self.type_name)
            .field("constructible", &self.is_constructible())
            .field("methods", &self.method_names())
            .field("fields", &self.field_names())
            .finish()
    }
}

/// Typed builder for [`EntityBinding`].
pub struct BindingBuilder<T> {
    binding: EntityBinding,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Any + Send> BindingBuilder<T> {
    pub fn constructor<F>(mut self, ctor: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.binding.constructor = Some(Arc::new(move || Box::new(ctor()) as Box<dyn Any + Send>));
        self
    }

    /// Use `T::default()` as the constructor.
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// A setter method taking a scalar value deserialized into `V`.
    pub fn method<V, F>(mut self, name: &str, setter: F) -> Self
    where
        V: DeserializeOwned + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let writer = self.erase(scalar(name.to_string(), setter));
        self.binding.methods.insert(name.to_string(), writer);
        self
    }

    /// A setter method taking a to-one related entity of Rust type `R`.
    pub fn method_to_one<R, F>(mut self, name: &str, setter: F) -> Self
    where
        R: Any + Send,
        F: Fn(&mut T, Option<R>) + Send + Sync + 'static,
    {
        let writer = self.erase(to_one(name.to_string(), setter));
        self.binding.methods.insert(name.to_string(), writer);
        self
    }

    /// A setter method taking a to-many collection of related entities.
    pub fn method_to_many<R, F>(mut self, name: &str, setter: F) -> Self
    where
        R: Any + Send,
        F: Fn(&mut T, Vec<R>) + Send + Sync + 'static,
    {
        let writer = self.erase(to_many(name.to_string(), setter));
        self.binding.methods.insert(name.to_string(), writer);
        self
    }

    /// A setter method that handles the raw payload itself.
    pub fn method_raw<F>(mut self, name: &str, setter: F) -> Self
    where
        F: Fn(&mut T, Payload) -> Result<(), AssignmentError> + Send + Sync + 'static,
    {
        let writer = self.erase(setter);
        self.binding.methods.insert(name.to_string(), writer);
        self
    }

    /// A scalar field.
    pub fn field<V, F>(mut self, name: &str, visibility: Visibility, write: F) -> Self
    where
        V: DeserializeOwned + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let writer = self.erase(scalar(name.to_string(), write));
        self.insert_field(name, visibility, writer);
        self
    }

    /// A field holding a to-one related entity.
    pub fn field_to_one<R, F>(mut self, name: &str, visibility: Visibility, write: F) -> Self
    where
        R: Any + Send,
        F: Fn(&mut T, Option<R>) + Send + Sync + 'static,
    {
        let writer = self.erase(to_one(name.to_string(), write));
        self.insert_field(name, visibility, writer);
        self
    }

    /// A field holding a to-many collection of related entities.
    pub fn field_to_many<R, F>(mut self, name: &str, visibility: Visibility, write: F) -> Self
    where
        R: Any + Send,
        F: Fn(&mut T, Vec<R>) + Send + Sync + 'static,
    {
        let writer = self.erase(to_many(name.to_string(), write));
        self.insert_field(name, visibility, writer);
        self
    }

    pub fn build(self) -> EntityBinding {
        self.binding
    }

    fn insert_field(&mut self, name: &str, visibility: Visibility, writer: Writer) {
        self.binding
            .fields
            .insert(name.to_string(), FieldSlot { visibility, writer });
    }

    fn erase<F>(&self, typed: F) -> Writer
    where
        F: Fn(&mut T, Payload) -> Result<(), AssignmentError> + Send + Sync + 'static,
    {
        let expected = self.binding.type_name.clone();
        Arc::new(move |target: &mut (dyn Any + Send), payload: Payload| {
            let target = target
                .downcast_mut::<T>()
                .ok_or_else(|| AssignmentError::TypeMismatch {
                    expected: expected.clone(),
                    found: "an instance of another Rust type".into(),
                })?;
            typed(target, payload)
        })
    }
}

fn scalar<T, V, F>(member: String, write: F) -> impl Fn(&mut T, Payload) -> Result<(), AssignmentError>
where
    V: DeserializeOwned,
    F: Fn(&mut T, V),
{
    move |target: &mut T, payload: Payload| match payload {
        Payload::Value(value) => {
            let value = serde_json::from_value::<V>(value).map_err(|e| {
                AssignmentError::InvalidValue {
                    member: member.clone(),
                    reason: e.to_string(),
                }
            })?;
            write(target, value);
            Ok(())
        }
        other => Err(unexpected(&member, "a scalar value", &other)),
    }
}

fn to_one<T, R, F>(member: String, write: F) -> impl Fn(&mut T, Payload) -> Result<(), AssignmentError>
where
    R: Any + Send,
    F: Fn(&mut T, Option<R>),
{
    move |target: &mut T, payload: Payload| match payload {
        Payload::Entity(None) => {
            write(target, None);
            Ok(())
        }
        Payload::Entity(Some(related)) => {
            write(target, Some(related.into_inner::<R>()?));
            Ok(())
        }
        other => Err(unexpected(&member, "a to-one entity", &other)),
    }
}

fn to_many<T, R, F>(member: String, write: F) -> impl Fn(&mut T, Payload) -> Result<(), AssignmentError>
where
    R: Any + Send,
    F: Fn(&mut T, Vec<R>),
{
    move |target: &mut T, payload: Payload| match payload {
        Payload::Entities(related) => {
            let items = related
                .into_iter()
                .map(EntityInstance::into_inner::<R>)
                .collect::<Result<Vec<R>, _>>()?;
            write(target, items);
            Ok(())
        }
        other => Err(unexpected(&member, "a to-many collection", &other)),
    }
}

fn unexpected(member: &str, expected: &str, got: &Payload) -> AssignmentError {
    AssignmentError::InvalidValue {
        member: member.to_string(),
        reason: format!("expected {expected}, got {}", got.kind()),
    }
}

/// A type-erased entity together with its binding.
pub struct EntityInstance {
    binding: Arc<EntityBinding>,
    inner: Box<dyn Any + Send>,
    access: Access,
}

impl EntityInstance {
    /// Wrap an existing value. Fails if `T` is not the Rust type the binding describes.
    pub fn new<T: Any + Send>(binding: Arc<EntityBinding>, value: T) -> Result<Self, AssignmentError> {
        if binding.type_id != TypeId::of::<T>() {
            return Err(AssignmentError::TypeMismatch {
                expected: binding.type_name.clone(),
                found: std::any::type_name::<T>().to_string(),
            });
        }
        Ok(Self {
            binding,
            inner: Box::new(value),
            access: Access::default(),
        })
    }

    pub fn type_name(&self) -> &str {
        self.binding.type_name()
    }

    pub fn binding(&self) -> &Arc<EntityBinding> {
        &self.binding
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut::<T>()
    }

    /// Unwrap into the concrete Rust type.
    pub fn into_inner<T: Any>(self) -> Result<T, AssignmentError> {
        let type_name = self.binding.type_name.clone();
        self.inner
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| AssignmentError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: type_name,
            })
    }

    /// Invoke a named setter method.
    pub fn call_method(&mut self, method: &str, payload: Payload) -> Result<(), AssignmentError> {
        let writer = self
            .binding
            .methods
            .get(method)
            .cloned()
            .ok_or_else(|| AssignmentError::NoSuchMethod {
                entity_type: self.binding.type_name.clone(),
                method: method.to_string(),
            })?;
        writer(self.inner.as_mut(), payload)
    }

    /// Write a field. Private fields require [`Access::Privileged`].
    pub fn write_field(&mut self, field: &str, payload: Payload) -> Result<(), AssignmentError> {
        let slot = self
            .binding
            .fields
            .get(field)
            .ok_or_else(|| AssignmentError::NoSuchField {
                entity_type: self.binding.type_name.clone(),
                field: field.to_string(),
            })?;

        if slot.visibility == Visibility::Private && self.access != Access::Privileged {
            return Err(AssignmentError::Inaccessible {
                entity_type: self.binding.type_name.clone(),
                field: field.to_string(),
            });
        }

        let writer = Arc::clone(&slot.writer);
        writer(self.inner.as_mut(), payload)
    }

    /// Hold privileged access until the returned guard is dropped.
    ///
    /// The previous access level is restored on drop, whether or not the
    /// writes made through the guard succeeded.
    pub fn elevate(&mut self) -> ElevatedAccess<'_> {
        let previous = std::mem::replace(&mut self.access, Access::Privileged);
        ElevatedAccess {
            entity: self,
            previous,
        }
    }
}

impl fmt::Debug for EntityInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityInstance")
            .field("type_name", &self.binding.type_name)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

/// Scoped privileged access to an entity. See [`EntityInstance::elevate`].
pub struct ElevatedAccess<'a> {
    entity: &'a mut EntityInstance,
    previous: Access,
}

impl Deref for ElevatedAccess<'_> {
    type Target = EntityInstance;

    fn deref(&self) -> &EntityInstance {
        &*self.entity
    }
}

impl DerefMut for ElevatedAccess<'_> {
    fn deref_mut(&mut self) -> &mut EntityInstance {
        &mut *self.entity
    }
}

impl Drop for ElevatedAccess<'_> {
    fn drop(&mut self) {
        self.entity.access = self.previous;
    }
}

/// All entity bindings known to the application, by entity name.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    bindings: HashMap<String, Arc<EntityBinding>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding. Replaces any existing binding with the same name.
    pub fn register(&mut self, binding: EntityBinding) -> Arc<EntityBinding> {
        let binding = Arc::new(binding);
        self.bindings
            .insert(binding.type_name.clone(), Arc::clone(&binding));
        binding
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<EntityBinding>> {
        self.bindings.get(type_name).cloned()
    }

    /// Construct a bare instance of `type_name`.
    pub fn construct(&self, type_name: &str) -> Result<EntityInstance, ResolveError> {
        self.bindings
            .get(type_name)
            .and_then(|binding| binding.construct())
            .ok_or_else(|| ResolveError::NotConstructible(type_name.to_string()))
    }

    /// Wrap an existing value as an instance of `type_name`.
    pub fn wrap<T: Any + Send>(&self, type_name: &str, value: T) -> Result<EntityInstance, ResolveError> {
        let binding = self
            .get(type_name)
            .ok_or_else(|| ResolveError::NotConstructible(type_name.to_string()))?;
        EntityInstance::new(binding, value).map_err(|source| ResolveError::WrongType {
            entity_type: type_name.to_string(),
            source,
        })
    }

    /// Registered entity names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct Tag {
        label: String,
    }

    #[derive(Debug, Default)]
    struct Post {
        title: String,
        secret: u32,
        tags: Vec<Tag>,
        pinned: Option<Tag>,
    }

    fn post_binding() -> Arc<EntityBinding> {
        Arc::new(
            EntityBinding::builder::<Post>("Post")
                .default_constructor()
                .method("setTitle", |p: &mut Post, v: String| p.title = v)
                .method_to_many("setTags", |p: &mut Post, v: Vec<Tag>| p.tags = v)
                .field("title", Visibility::Public, |p: &mut Post, v: String| p.title = v)
                .field("secret", Visibility::Private, |p: &mut Post, v: u32| p.secret = v)
                .field_to_one("pinned", Visibility::Public, |p: &mut Post, v: Option<Tag>| p.pinned = v)
                .build(),
        )
    }

    fn tag_binding() -> Arc<EntityBinding> {
        Arc::new(
            EntityBinding::builder::<Tag>("Tag")
                .default_constructor()
                .field("label", Visibility::Public, |t: &mut Tag, v: String| t.label = v)
                .build(),
        )
    }

    fn tag(label: &str) -> EntityInstance {
        EntityInstance::new(tag_binding(), Tag { label: label.into() }).unwrap()
    }

    #[test]
    fn construct_and_call_method() {
        let mut post = post_binding().construct().unwrap();
        post.call_method("setTitle", Payload::Value(json!("Hello"))).unwrap();
        assert_eq!(post.downcast_ref::<Post>().unwrap().title, "Hello");
    }

    #[test]
    fn missing_method_is_reported() {
        let mut post = post_binding().construct().unwrap();
        let err = post.call_method("setBody", json!("x").into()).unwrap_err();
        assert!(matches!(err, AssignmentError::NoSuchMethod { ref method, .. } if method == "setBody"));
    }

    #[test]
    fn invalid_scalar_value_is_reported() {
        let mut post = post_binding().construct().unwrap();
        let err = post.call_method("setTitle", json!(12).into()).unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidValue { .. }));

        let err = post
            .elevate()
            .write_field("secret", json!("not a number").into())
            .unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidValue { .. }));
    }

    #[test]
    fn private_field_requires_elevation() {
        let mut post = post_binding().construct().unwrap();
        let err = post.write_field("secret", json!(7).into()).unwrap_err();
        assert!(matches!(err, AssignmentError::Inaccessible { .. }));

        post.elevate().write_field("secret", json!(7).into()).unwrap();
        assert_eq!(post.downcast_ref::<Post>().unwrap().secret, 7);
        assert_eq!(post.access(), Access::Restricted);
    }

    #[test]
    fn elevation_is_restored_after_failed_write() {
        let mut post = post_binding().construct().unwrap();
        {
            let mut guard = post.elevate();
            assert_eq!(guard.access(), Access::Privileged);
            assert!(guard.write_field("missing", json!(1).into()).is_err());
        }
        assert_eq!(post.access(), Access::Restricted);
    }

    #[test]
    fn nested_elevation_restores_outer_level() {
        let mut post = post_binding().construct().unwrap();
        let mut outer = post.elevate();
        {
            let inner = outer.elevate();
            assert_eq!(inner.access(), Access::Privileged);
        }
        assert_eq!(outer.access(), Access::Privileged);
        drop(outer);
        assert_eq!(post.access(), Access::Restricted);
    }

    #[test]
    fn relation_writers_downcast_related_entities() {
        let mut post = post_binding().construct().unwrap();
        post.call_method("setTags", vec![tag("rust"), tag("orm")].into()).unwrap();
        post.write_field("pinned", tag("rust").into()).unwrap();

        let inner = post.downcast_ref::<Post>().unwrap();
        assert_eq!(inner.tags.len(), 2);
        assert_eq!(inner.tags[1].label, "orm");
        assert_eq!(inner.pinned, Some(Tag { label: "rust".into() }));
    }

    #[test]
    fn relation_of_wrong_type_is_a_mismatch() {
        let mut post = post_binding().construct().unwrap();
        let other_post = post_binding().construct().unwrap();
        let err = post.write_field("pinned", other_post.into()).unwrap_err();
        assert!(matches!(err, AssignmentError::TypeMismatch { .. }));
    }

    #[test]
    fn wrapping_a_foreign_type_fails() {
        let err = EntityInstance::new(post_binding(), Tag::default()).unwrap_err();
        assert!(matches!(err, AssignmentError::TypeMismatch { .. }));
    }

    #[test]
    fn registry_constructs_registered_types_only() {
        let mut registry = EntityRegistry::new();
        registry.register(
            EntityBinding::builder::<Tag>("Tag")
                .default_constructor()
                .build(),
        );
        registry.register(EntityBinding::builder::<Post>("Abstract").build());

        assert!(registry.construct("Tag").unwrap().is::<Tag>());
        assert!(matches!(
            registry.construct("Abstract"),
            Err(ResolveError::NotConstructible(_))
        ));
        assert!(registry.construct("Nope").is_err());
        assert_eq!(registry.names(), vec!["Abstract", "Tag"]);
    }

    #[test]
    fn wrapping_the_wrong_rust_type_keeps_the_reason() {
        let mut registry = EntityRegistry::new();
        registry.register(EntityBinding::builder::<Tag>("Tag").default_constructor().build());

        assert!(registry.wrap("Tag", Tag::default()).unwrap().is::<Tag>());

        let err = registry.wrap("Tag", Post::default()).unwrap_err();
        match &err {
            ResolveError::WrongType { entity_type, source } => {
                assert_eq!(entity_type, "Tag");
                assert!(matches!(source, AssignmentError::TypeMismatch { .. }));
            }
            other => panic!("expected WrongType, got {other:?}"),
        }
        assert!(!err.to_string().contains("constructor"));

        assert_eq!(
            registry.wrap("Nope", Tag::default()).unwrap_err(),
            ResolveError::NotConstructible("Nope".into())
        );
    }
}
