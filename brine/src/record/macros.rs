//! The `record!` declaration macro.

/// Implements [`Record`](crate::record::Record) for an existing struct.
///
/// ```
/// use brine::{Blit, Jar, Window, jars, record::RecordBuilder};
///
/// #[repr(C)]
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Point {
///     fn new(x: i32, y: i32) -> Self {
///         Self { x, y }
///     }
/// }
///
/// // SAFETY: two `i32`s, no padding, every bit pattern valid
/// unsafe impl Blit for Point {}
///
/// brine::record! {
///     Point {
///         layout: C,
///         fields: { x: i32, y: i32 },
///         constructors: { new(x: i32, y: i32) => Point::new },
///         blit: Blit,
///     }
/// }
///
/// let jar = RecordBuilder::<Point>::new()
///     .member("x", jars::i32_ne())
///     .member("y", jars::i32_ne())
///     .build()
///     .unwrap();
/// assert!(jar.blit_layout().is_some());
/// let bytes = jar.encode(&Point::new(1, -1)).unwrap();
/// assert_eq!(jar.decode(Window::new(&bytes)).unwrap().value, Point::new(1, -1));
/// ```
///
/// Sections, in this order:
///
/// - `layout`: `C`, `Packed` or `Rust`, matching the struct's `#[repr]`
/// - `fields`: every field with its type; each becomes a getter
/// - `setters` (optional): fields the binder may assign after construction
/// - `constructors` (optional): `name(params) => path`, where `path` takes
///   the parameters in order; parameter names must match fields
/// - `zeroed` (optional): a `fn() -> Self` used when no constructor fits
/// - `blit: Blit` (optional): offer raw-copy operations; the struct must
///   implement [`Blit`](crate::Blit)
///
/// Getters of `Packed` records copy the field out instead of borrowing it,
/// so their field types must be `Copy`.
#[macro_export]
macro_rules! record {
    (@getter Packed, $ty:ty, $field:ident) => {{
        fn get(value: &$ty) -> $crate::record::MemberRef<'_> {
            $crate::record::owned({ value.$field })
        }
        get as $crate::record::GetFn<$ty>
    }};
    (@getter $layout:ident, $ty:ty, $field:ident) => {{
        fn get(value: &$ty) -> $crate::record::MemberRef<'_> {
            $crate::record::MemberRef::Borrowed(&value.$field)
        }
        get as $crate::record::GetFn<$ty>
    }};
    (
        $ty:ty {
            layout: $layout:ident,
            fields: { $($field:ident : $fty:ty),* $(,)? }
            $(, setters: { $($set:ident : $sty:ty),* $(,)? })?
            $(, constructors: {
                $($ctor:ident ( $($param:ident : $pty:ty),* $(,)? ) => $call:path),* $(,)?
            })?
            $(, zeroed: $zeroed:path)?
            $(, blit: $witness:ident)?
            $(,)?
        }
    ) => {
        impl $crate::record::Record for $ty {
            fn shape() -> $crate::Shape {
                $crate::Shape::of::<$ty>($crate::Repr::$layout)
                    $(.field($crate::FieldShape {
                        name: ::core::stringify!($field),
                        offset: ::core::mem::offset_of!($ty, $field),
                        size: ::core::mem::size_of::<$fty>(),
                        ty: $crate::TypeInfo::of::<$fty>(),
                    }))*
            }

            fn binding() -> $crate::record::Binding<Self> {
                $crate::record::Binding::<$ty>::new()
                    $(.getter::<$fty>(
                        ::core::stringify!($field),
                        $crate::record!(@getter $layout, $ty, $field),
                    ))*
                    $($(.setter::<$sty>(::core::stringify!($set), {
                        fn set(
                            value: &mut $ty,
                            slot: &mut $crate::record::Slot,
                        ) -> ::core::result::Result<(), $crate::DecodeError> {
                            value.$set = slot.take::<$sty>(::core::stringify!($set))?;
                            ::core::result::Result::Ok(())
                        }
                        set
                    }))*)?
                    $($(.constructor(
                        ::core::stringify!($ctor),
                        [$($crate::record::Param::of::<$pty>(::core::stringify!($param))),*],
                        {
                            #[allow(unused_variables)]
                            fn construct(
                                args: &mut $crate::record::Args<'_>,
                            ) -> ::core::result::Result<$ty, $crate::DecodeError> {
                                ::core::result::Result::Ok($call($(args.param::<$pty>()?),*))
                            }
                            construct
                        },
                    ))*)?
                    $(.zeroed($zeroed))?
            }

            $(
                fn blit_ops() -> ::core::option::Option<$crate::BlitOps<Self>> {
                    fn witness<T: $crate::$witness>() -> $crate::BlitOps<T> {
                        $crate::BlitOps::of()
                    }
                    ::core::option::Option::Some(witness::<Self>())
                }
            )?
        }
    };
}
