use alloc::boxed::Box;

use crate::error::SaverError;
use crate::saver::Saver;

// -----------------------------------------------------------------------------
// Saveable

/// The capability of declaring one's own field-by-field traversal.
///
/// A saveable type exposes exactly one operation: [`save_data`] receives a
/// [`Saver`] and declares, field by field, how the type maps into the backing
/// store. The same body runs for saving and for loading — the saver instance
/// decides the direction, which is what keeps the two structurally in sync.
///
/// The receiver is `&mut self` in both directions: each declared field hands
/// the saver a `&mut` borrow that serves as the current value when saving and
/// as the assignment target when loading. In save mode the engine only ever
/// reads through those borrows.
///
/// There is no inheritance requirement: any plain mutable type qualifies. A
/// fresh instance for loading is produced by a caller-supplied factory keyed
/// by the [type tag](Saver::add_key), or by `Default` where the declaration
/// site opted into it.
///
/// # Examples
///
/// ```
/// use ks_save::{SaverError, Saveable, Saver, field_name};
///
/// #[derive(Default)]
/// struct Furniture {
///     price: f32,
///     label: String,
/// }
///
/// impl Saveable for Furniture {
///     fn save_data(&mut self, saver: &mut impl Saver) -> Result<(), SaverError> {
///         saver.add_key("demo.Furniture")?;
///         saver.add_value(&mut self.price, field_name!(self.price))?;
///         saver.add_value(&mut self.label, field_name!(self.label))?;
///         Ok(())
///     }
/// }
/// ```
///
/// [`save_data`]: Self::save_data
pub trait Saveable {
    /// Declares this type's traversal against the given saver.
    ///
    /// Invoked once per save run (producing a populated store node from live
    /// field values) and once per load run (consuming a populated node and
    /// assigning through the field borrows). Implementations should declare
    /// every persistent field through exactly one `add_*` operation and do
    /// nothing else.
    fn save_data(&mut self, saver: &mut impl Saver) -> Result<(), SaverError>;
}

// Recursive graphs declare their nested field as `Option<Box<Self>>`.
impl<T: Saveable> Saveable for Box<T> {
    #[inline]
    fn save_data(&mut self, saver: &mut impl Saver) -> Result<(), SaverError> {
        (**self).save_data(saver)
    }
}
