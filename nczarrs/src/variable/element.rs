//! Typed elements of a variable.

use super::DataType;

/// A native element type with a corresponding [`DataType`].
///
/// Elements are [`bytemuck::Pod`], so slices of elements are reinterpreted as bytes without copying.
pub trait Element: bytemuck::Pod + Send + Sync {
    /// The data type of the element.
    const DATA_TYPE: DataType;
}

macro_rules! impl_element {
    ($t:ty, $data_type:expr) => {
        impl Element for $t {
            const DATA_TYPE: DataType = $data_type;
        }
    };
}

impl_element!(i8, DataType::Byte);
impl_element!(i16, DataType::Short);
impl_element!(i32, DataType::Int);
impl_element!(f32, DataType::Float);
impl_element!(f64, DataType::Double);
impl_element!(u8, DataType::UByte);
impl_element!(u16, DataType::UShort);
impl_element!(u32, DataType::UInt);
impl_element!(i64, DataType::Int64);
impl_element!(u64, DataType::UInt64);
