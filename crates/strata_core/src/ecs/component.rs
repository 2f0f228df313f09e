//! # Component System
//!
//! Components are pure data containers with no behavior. Any `'static` type
//! qualifies; the registry assigns each one a signature bit at registration.
//!
//! [`ComponentSet`] lets a tuple of component types stand for a signature,
//! which is how systems declare what they require.

use super::registry::ComponentRegistry;
use super::signature::Signature;

/// Marker trait for ECS components.
///
/// Blanket-implemented for every `'static` type. Plain `Copy` records are the
/// common case, but owning types such as `String` work too.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Default)]
/// struct Position {
///     x: f32,
///     y: f32,
/// }
///
/// world.register_component::<Position>();
/// ```
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// A tuple of component types that maps to a [`Signature`].
///
/// Implemented for the unit type and tuples of up to eight components.
pub trait ComponentSet {
    /// Builds a signature with exactly the bits of these types set.
    ///
    /// # Panics
    ///
    /// Panics if any type is not registered.
    fn signature(registry: &ComponentRegistry) -> Signature;
}

impl ComponentSet for () {
    #[inline]
    fn signature(_registry: &ComponentRegistry) -> Signature {
        Signature::EMPTY
    }
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            #[inline]
            #[track_caller]
            fn signature(registry: &ComponentRegistry) -> Signature {
                let mut signature = Signature::EMPTY;
                $( signature.set(registry.bit::<$name>()); )+
                signature
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    struct Mass(f32);
    struct Charge(f32);
    struct Label(String);

    #[test]
    fn test_tuple_signature_sets_registered_bits() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Mass>();
        registry.register::<Charge>();
        registry.register::<Label>();

        let sig = <(Mass, Label)>::signature(&registry);
        assert_eq!(sig, Signature::EMPTY.with(0).with(2));

        // Order inside the tuple does not matter.
        assert_eq!(<(Label, Mass)>::signature(&registry), sig);
        assert!(<()>::signature(&registry).is_empty());

        let _ = (Mass(1.0).0, Charge(1.0).0, Label(String::new()).0);
    }

    #[test]
    #[should_panic(expected = "not registered before use")]
    fn test_unregistered_member_panics() {
        let registry = ComponentRegistry::new();
        let _ = <(Mass,)>::signature(&registry);
    }
}
