//! Binding structs to member codecs, and the raw-copy path.

use brine::record::{Record, RecordBuilder};
use brine::{
    BindError, Blit, BlitLayout, BlitRejection, DecodeError, Jar, JarExt, MemberFacts, MemberKey,
    Parsed, Window, jars,
};
use eyre::Result;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

impl Point {
    fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// SAFETY: two `i32`s, no padding
unsafe impl Blit for Point {}

brine::record! {
    Point {
        layout: C,
        fields: { x: i32, y: i32 },
        constructors: { new(x: i32, y: i32) => Point::new },
        blit: Blit,
    }
}

#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Header {
    magic: u32,
    version: u16,
    flags: u8,
}

// SAFETY: integers only, packed
unsafe impl Blit for Header {}

brine::record! {
    Header {
        layout: Packed,
        fields: { magic: u32, version: u16, flags: u8 },
        setters: { magic: u32, version: u16, flags: u8 },
        zeroed: Header::default,
        blit: Blit,
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Padded {
    tag: u8,
    value: u32,
}

brine::record! {
    Padded {
        layout: C,
        fields: { tag: u8, value: u32 },
        setters: { tag: u8, value: u32 },
        zeroed: Padded::default,
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Person {
    name: String,
    age: u32,
    nickname: String,
}

impl Person {
    fn new(name: String, age: u32) -> Self {
        Self {
            name,
            age,
            nickname: String::new(),
        }
    }

    fn full(name: String, age: u32, nickname: String) -> Self {
        Self {
            name,
            age,
            nickname,
        }
    }
}

brine::record! {
    Person {
        layout: Rust,
        fields: { name: String, age: u32, nickname: String },
        setters: { nickname: String },
        constructors: {
            new(name: String, age: u32) => Person::new,
            full(name: String, age: u32, nickname: String) => Person::full,
        },
    }
}

fn point_jar() -> Result<brine::record::RecordJar<Point>> {
    Ok(RecordBuilder::<Point>::new()
        .member("x", jars::i32_ne())
        .member("y", jars::i32_ne())
        .build()?)
}

fn point_jar_composed() -> Result<brine::record::RecordJar<Point>> {
    Ok(RecordBuilder::<Point>::new()
        .member("x", jars::i32_ne())
        .member("y", jars::i32_ne())
        .without_blit()
        .build()?)
}

// ============================================================================
// Raw copy vs member by member
// ============================================================================

mod blit {
    use super::*;

    #[test]
    fn test_exact_layout_takes_the_raw_copy() -> Result<()> {
        brine_testhelpers::setup();
        let jar = point_jar()?;
        let layout = jar.blit_layout().expect("point should be blittable");
        assert_eq!(layout.size(), 8);
        assert_eq!(layout.offsets(), &[("x", 0), ("y", 4)]);
        assert!(jar.meta().is_blittable());
        assert!(jar.blit().is_some());
        Ok(())
    }

    #[test]
    fn test_disabling_blit_changes_nothing_observable() -> Result<()> {
        brine_testhelpers::setup();
        let fast = point_jar()?;
        let slow = point_jar_composed()?;
        assert_eq!(slow.blit_rejection(), Some(&BlitRejection::Disabled));

        for point in [Point::new(0, 0), Point::new(-7, i32::MAX), Point::new(1, 2)] {
            let bytes = fast.encode(&point)?;
            assert_eq!(slow.encode(&point)?, bytes);
            assert_eq!(fast.decode(Window::new(&bytes))?, Parsed::new(point, 8));
            assert_eq!(slow.decode(Window::new(&bytes))?, Parsed::new(point, 8));
        }

        let short = [0u8; 7];
        assert_eq!(
            fast.decode(Window::new(&short)),
            slow.decode(Window::new(&short))
        );
        Ok(())
    }

    #[test]
    fn test_bulk_records_agree() -> Result<()> {
        brine_testhelpers::setup();
        let points: Vec<Point> = (0..50).map(|i| Point::new(i, -i)).collect();
        let fast = point_jar()?.repeat_until_end()?;
        let slow = point_jar_composed()?.repeat_until_end()?;
        let bytes = fast.encode(&points)?;
        assert_eq!(slow.encode(&points)?, bytes);
        assert_eq!(fast.decode(Window::new(&bytes))?.value, points);
        assert_eq!(slow.decode(Window::new(&bytes))?.value, points);
        Ok(())
    }

    #[test]
    fn test_packed_headers() -> Result<()> {
        brine_testhelpers::setup();
        let jar = RecordBuilder::<Header>::new()
            .member("magic", jars::u32_ne())
            .member("version", jars::u16_ne())
            .member("flags", jars::u8())
            .build()?;
        assert_eq!(jar.blit_layout().map(|l| l.size()), Some(7));
        assert_eq!(jar.constructor(), None);

        let header = Header {
            magic: 0xcafe_f00d,
            version: 3,
            flags: 0x80,
        };
        let bytes = jar.encode(&header)?;
        assert_eq!(bytes.len(), 7);
        assert_eq!(jar.decode(Window::new(&bytes))?.value, header);

        let composed = RecordBuilder::<Header>::new()
            .member("magic", jars::u32_ne())
            .member("version", jars::u16_ne())
            .member("flags", jars::u8())
            .without_blit()
            .build()?;
        assert_eq!(composed.encode(&header)?, bytes);
        Ok(())
    }

    #[test]
    fn test_rejections_fall_back() -> Result<()> {
        brine_testhelpers::setup();
        let padded = RecordBuilder::<Padded>::new()
            .member("tag", jars::u8())
            .member("value", jars::u32_ne())
            .build()?;
        assert_eq!(padded.blit_rejection(), Some(&BlitRejection::NoWitness));
        let (tag, value) = (MemberKey::new("tag"), MemberKey::new("value"));
        let facts = [
            MemberFacts {
                name: "tag",
                key: &tag,
                meta: jars::u8().meta(),
            },
            MemberFacts {
                name: "value",
                key: &value,
                meta: jars::u32_ne().meta(),
            },
        ];
        assert_eq!(
            BlitLayout::analyze(&Padded::shape(), &facts),
            Err(BlitRejection::Padding(3))
        );
        let value = Padded { tag: 1, value: 2 };
        let bytes = padded.encode(&value)?;
        assert_eq!(bytes.len(), 5);
        assert_eq!(padded.decode(Window::new(&bytes))?.value, value);

        let foreign = RecordBuilder::<Point>::new()
            .member("x", jars::i32_be())
            .member("y", jars::i32_be())
            .build()?;
        let big_endian = cfg!(target_endian = "big");
        assert_eq!(foreign.blit_layout().is_some(), big_endian);
        assert_eq!(
            foreign.encode(&Point::new(1, 2))?,
            [0, 0, 0, 1, 0, 0, 0, 2]
        );

        let swapped = RecordBuilder::<Point>::new()
            .member("y", jars::i32_ne())
            .member("x", jars::i32_ne())
            .build()?;
        assert!(matches!(
            swapped.blit_rejection(),
            Some(BlitRejection::Offset { implied: 0, actual: 4, .. })
        ));
        let bytes = swapped.encode(&Point::new(1, 2))?;
        assert_eq!(bytes, jars::i32_ne().then(jars::i32_ne())?.encode(&(2, 1))?);
        Ok(())
    }
}

// ============================================================================
// Constructors and setters
// ============================================================================

mod binding {
    use super::*;

    #[test]
    fn test_most_specific_constructor_wins() -> Result<()> {
        brine_testhelpers::setup();
        let jar = RecordBuilder::<Person>::new()
            .member("name", jars::utf8().null_terminated())
            .member("age", jars::u32_be())
            .member("nickname", jars::utf8().null_terminated())
            .build()?;
        assert_eq!(jar.constructor(), Some("full"));

        let short = RecordBuilder::<Person>::new()
            .member("getName", jars::utf8().null_terminated())
            .member("Age", jars::u32_be())
            .build()?;
        assert_eq!(short.constructor(), Some("new"));

        let bytes = b"Ada\0\0\0\0\x24";
        let parsed = short.decode(Window::new(bytes))?;
        assert_eq!(parsed.value, Person::new("Ada".into(), 36));
        assert_eq!(parsed.consumed, 8);
        Ok(())
    }

    #[test]
    fn test_members_decode_in_declaration_order() -> Result<()> {
        brine_testhelpers::setup();
        let jar = RecordBuilder::<Person>::new()
            .member("age", jars::u8().select(u32::from, |age: &u32| *age as u8))
            .member("nickname", jars::utf8().null_terminated())
            .member("name", jars::utf8())
            .build()?;
        let person = Person::full("Grace".into(), 85, "amazing".into());
        let bytes = jar.encode(&person)?;
        assert_eq!(bytes, b"\x55amazing\0Grace");
        assert_eq!(jar.decode(Window::new(&bytes))?.value, person);
        Ok(())
    }

    #[test]
    fn test_read_only_members_need_a_constructor() {
        brine_testhelpers::setup();
        let err = RecordBuilder::<Person>::new()
            .member("nickname", jars::utf8().null_terminated())
            .member("age", jars::u32_be())
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::ReadOnlyMember { name, .. } if name == "age"));
    }

    #[test]
    fn test_type_mismatch_is_a_binding_error() {
        brine_testhelpers::setup();
        let err = RecordBuilder::<Point>::new()
            .member("x", jars::u32_be())
            .member("y", jars::i32_be())
            .build()
            .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"member `x` holds `i32` but its codec produces `u32`");
    }

    #[test]
    fn test_decode_errors_surface_unchanged() -> Result<()> {
        brine_testhelpers::setup();
        let jar = RecordBuilder::<Person>::new()
            .member("name", jars::utf8().null_terminated())
            .member("age", jars::u32_be())
            .build()?;
        assert!(matches!(
            jar.decode(Window::new(b"Ada\0\0\0")),
            Err(DecodeError::DataFragment { offset: 4, needed: 4, available: 2 })
        ));
        Ok(())
    }
}

// ============================================================================
// Ambiguity and unknown names
// ============================================================================

mod ambiguity {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pair {
        left: u8,
        right: u8,
    }

    impl Pair {
        fn left_first(left: u8, right: u8) -> Self {
            Self { left, right }
        }

        fn right_first(right: u8, left: u8) -> Self {
            Self { left, right }
        }
    }

    brine::record! {
        Pair {
            layout: Rust,
            fields: { left: u8, right: u8 },
            constructors: {
                left_first(left: u8, right: u8) => Pair::left_first,
                right_first(right: u8, left: u8) => Pair::right_first,
            },
        }
    }

    #[derive(Debug, PartialEq)]
    struct Orphan {
        value: u8,
    }

    impl Orphan {
        fn new(_: u8) -> Self {
            Self { value: 0 }
        }
    }

    brine::record! {
        Orphan {
            layout: Rust,
            fields: { value: u8 },
            constructors: { new(other: u8) => Orphan::new },
        }
    }

    #[derive(Debug, PartialEq)]
    struct Range {
        lo: u8,
        hi: u8,
    }

    impl Range {
        fn new(lo: u8, hi: u8) -> Self {
            Self { lo, hi }
        }

        fn from_width(width: u8) -> Self {
            Self { lo: 0, hi: width }
        }
    }

    brine::record! {
        Range {
            layout: Rust,
            fields: { lo: u8, hi: u8 },
            constructors: {
                new(lo: u8, hi: u8) => Range::new,
                from_width(width: u8) => Range::from_width,
            },
        }
    }

    #[test]
    fn test_unrelated_constructors_are_ignored() -> Result<()> {
        brine_testhelpers::setup();
        let jar = RecordBuilder::<Range>::new()
            .member("lo", jars::u8())
            .member("hi", jars::u8())
            .build()?;
        assert_eq!(jar.constructor(), Some("new"));
        assert_eq!(jar.decode(Window::new(&[2, 7]))?.value, Range::new(2, 7));
        Ok(())
    }

    #[test]
    fn test_equally_specific_constructors() {
        brine_testhelpers::setup();
        let err = RecordBuilder::<Pair>::new()
            .member("left", jars::u8())
            .member("right", jars::u8())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BindError::AmbiguousConstructor {
                first: "left_first",
                second: "right_first",
                ..
            }
        ));
    }

    // reported only because no constructor qualifies
    #[test]
    fn test_constructor_parameters_must_name_fields() {
        brine_testhelpers::setup();
        let err = RecordBuilder::<Orphan>::new()
            .member("value", jars::u8())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BindError::UnknownParameter {
                constructor: "new",
                parameter: "other"
            }
        );
    }

    #[test]
    fn test_unknown_member() {
        brine_testhelpers::setup();
        let err = RecordBuilder::<Pair>::new()
            .member("left", jars::u8())
            .member("middle", jars::u8())
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::UnknownMember { name, .. } if name == "middle"));
    }
}
