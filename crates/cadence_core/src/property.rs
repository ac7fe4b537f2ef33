//! Property adapters
//!
//! A property adapter reads and writes one animatable value on a holder
//! object and knows how to interpolate it. Jobs never touch holders directly;
//! they go through a [`Property`], which keeps the animation code independent
//! of whatever object model the host application uses.
//!
//! Holders are shared (jobs keep them alive across frames), so writes go
//! through `&Holder` and holders use interior mutability.

use std::fmt;
use std::rc::Rc;

// ============================================================================
// Interpolation
// ============================================================================

/// Linear interpolation between two values
///
/// `t` is not clamped: overshooting easings (back, elastic) rely on values
/// outside `0..=1`.
pub trait Lerp: Sized {
    fn lerp(&self, to: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp(&self, to: &Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for f64 {
    #[inline]
    fn lerp(&self, to: &Self, t: f32) -> Self {
        self + (to - self) * t as f64
    }
}

impl<const N: usize> Lerp for [f32; N] {
    fn lerp(&self, to: &Self, t: f32) -> Self {
        std::array::from_fn(|i| self[i].lerp(&to[i], t))
    }
}

/// Straight (non-premultiplied) RGBA color
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

impl Lerp for Rgba {
    fn lerp(&self, to: &Self, t: f32) -> Self {
        Self {
            r: self.r.lerp(&to.r, t),
            g: self.g.lerp(&to.g, t),
            b: self.b.lerp(&to.b, t),
            a: self.a.lerp(&to.a, t),
        }
    }
}

// ============================================================================
// Composite values
// ============================================================================

/// Color channel selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
    A,
}

/// Vector axis selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
    W,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
            Axis::W => 3,
        }
    }
}

/// A value made of independently animatable components
pub trait Composite {
    /// Selector naming one component
    type Part: Copy;
    type Component;

    fn component(&self, part: Self::Part) -> Self::Component;
    fn set_component(&mut self, part: Self::Part, value: Self::Component);
}

impl Composite for Rgba {
    type Part = Channel;
    type Component = f32;

    fn component(&self, part: Channel) -> f32 {
        match part {
            Channel::R => self.r,
            Channel::G => self.g,
            Channel::B => self.b,
            Channel::A => self.a,
        }
    }

    fn set_component(&mut self, part: Channel, value: f32) {
        match part {
            Channel::R => self.r = value,
            Channel::G => self.g = value,
            Channel::B => self.b = value,
            Channel::A => self.a = value,
        }
    }
}

/// Axes past the vector's length read as zero and ignore writes
impl<const N: usize> Composite for [f32; N] {
    type Part = Axis;
    type Component = f32;

    fn component(&self, part: Axis) -> f32 {
        self.get(part.index()).copied().unwrap_or(0.0)
    }

    fn set_component(&mut self, part: Axis, value: f32) {
        if let Some(slot) = self.get_mut(part.index()) {
            *slot = value;
        }
    }
}

// ============================================================================
// Property
// ============================================================================

/// Adapter contract between an animation job and an animatable value
pub trait Property {
    type Holder;
    type Value;

    /// Read the current value from the holder
    fn get(&self, holder: &Self::Holder) -> Self::Value;

    /// Write a value to the holder
    fn set(&self, holder: &Self::Holder, value: Self::Value);

    /// Interpolate between two values of this property
    fn lerp(&self, from: &Self::Value, to: &Self::Value, t: f32) -> Self::Value;
}

/// Type-erased, shareable property adapter
pub type SharedProperty<H, V> = Rc<dyn Property<Holder = H, Value = V>>;

impl<P: Property + ?Sized> Property for Rc<P> {
    type Holder = P::Holder;
    type Value = P::Value;

    fn get(&self, holder: &Self::Holder) -> Self::Value {
        (**self).get(holder)
    }

    fn set(&self, holder: &Self::Holder, value: Self::Value) {
        (**self).set(holder, value)
    }

    fn lerp(&self, from: &Self::Value, to: &Self::Value, t: f32) -> Self::Value {
        (**self).lerp(from, to, t)
    }
}

/// Property adapter built from plain accessor functions
pub struct Accessor<H, V> {
    getter: fn(&H) -> V,
    setter: fn(&H, V),
    lerp: fn(&V, &V, f32) -> V,
}

impl<H, V: Lerp> Accessor<H, V> {
    pub fn new(getter: fn(&H) -> V, setter: fn(&H, V)) -> Self {
        Self {
            getter,
            setter,
            lerp: V::lerp,
        }
    }
}

impl<H, V> Accessor<H, V> {
    /// Accessor for a value type without a [`Lerp`] impl
    pub fn with_lerp(getter: fn(&H) -> V, setter: fn(&H, V), lerp: fn(&V, &V, f32) -> V) -> Self {
        Self {
            getter,
            setter,
            lerp,
        }
    }
}

impl<H, V: Composite> Accessor<H, V> {
    /// Narrow this accessor to a single component of its value
    pub fn part(self, part: V::Part) -> PartAccessor<H, V> {
        PartAccessor { inner: self, part }
    }
}

impl<H, V> Clone for Accessor<H, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H, V> Copy for Accessor<H, V> {}

impl<H, V> fmt::Debug for Accessor<H, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("value", &std::any::type_name::<V>())
            .finish()
    }
}

impl<H, V> Property for Accessor<H, V> {
    type Holder = H;
    type Value = V;

    fn get(&self, holder: &H) -> V {
        (self.getter)(holder)
    }

    fn set(&self, holder: &H, value: V) {
        (self.setter)(holder, value)
    }

    fn lerp(&self, from: &V, to: &V, t: f32) -> V {
        (self.lerp)(from, to, t)
    }
}

/// Single-component view of a composite accessor
///
/// Writes read the whole value, replace one component and write it back, so
/// concurrent jobs on different components of the same value do not clobber
/// each other.
pub struct PartAccessor<H, V: Composite> {
    inner: Accessor<H, V>,
    part: V::Part,
}

impl<H, V: Composite> Clone for PartAccessor<H, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner,
            part: self.part,
        }
    }
}

impl<H, V> Property for PartAccessor<H, V>
where
    V: Composite,
    V::Component: Lerp,
{
    type Holder = H;
    type Value = V::Component;

    fn get(&self, holder: &H) -> V::Component {
        self.inner.get(holder).component(self.part)
    }

    fn set(&self, holder: &H, value: V::Component) {
        let mut whole = self.inner.get(holder);
        whole.set_component(self.part, value);
        self.inner.set(holder, whole);
    }

    fn lerp(&self, from: &V::Component, to: &V::Component, t: f32) -> V::Component {
        from.lerp(to, t)
    }
}
