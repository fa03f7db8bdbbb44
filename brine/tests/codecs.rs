//! Round trips and consumption for the built-in codecs and combinators.

use brine::{DecodeError, EncodeError, Jar, JarExt, Parsed, Window, jars};
use eyre::Result;

fn round_trip<J>(jar: &J, value: J::Value) -> Result<()>
where
    J: Jar,
    J::Value: PartialEq + core::fmt::Debug,
{
    let bytes = jar.encode(&value)?;
    assert_eq!(jar.encoded_len(&value)?, bytes.len(), "{}", jar.label());
    let parsed = jar.decode(Window::new(&bytes))?;
    assert_eq!(parsed, Parsed::new(value, bytes.len()), "{}", jar.label());
    Ok(())
}

// ============================================================================
// Primitives
// ============================================================================

mod primitives {
    use super::*;

    #[test]
    fn test_integers_round_trip() -> Result<()> {
        brine_testhelpers::setup();
        round_trip(&jars::u8(), 0xff)?;
        round_trip(&jars::i8(), -128)?;
        round_trip(&jars::u16_be(), 0xbeef)?;
        round_trip(&jars::i16_le(), -2)?;
        round_trip(&jars::u32_ne(), 0xdead_beef)?;
        round_trip(&jars::i32_be(), i32::MIN)?;
        round_trip(&jars::u64_le(), u64::MAX)?;
        round_trip(&jars::i64_ne(), -1)?;
        Ok(())
    }

    #[test]
    fn test_floats_round_trip() -> Result<()> {
        brine_testhelpers::setup();
        round_trip(&jars::f32_le(), 3.25)?;
        round_trip(&jars::f64_be(), f64::MIN_POSITIVE)?;
        round_trip(&jars::f64_ne(), -0.0)?;
        Ok(())
    }

    #[test]
    fn test_byte_order_example() -> Result<()> {
        brine_testhelpers::setup();
        let bytes = jars::u32_le().encode(&0x1234_5678)?;
        assert_eq!(bytes, [0x78, 0x56, 0x34, 0x12]);
        let parsed = jars::u32_be().decode(Window::new(&bytes))?;
        assert_eq!(parsed.value, 0x7856_3412);
        Ok(())
    }

    #[test]
    fn test_constant_length_consumes_exactly() -> Result<()> {
        brine_testhelpers::setup();
        let jar = jars::u32_be();
        let parsed = jar.decode(Window::new(&[0, 0, 1, 0, 0xaa, 0xbb]))?;
        assert_eq!(parsed, Parsed::new(256, 4));
        assert_eq!(
            jar.decode(Window::new(&[0, 0, 1])),
            Err(DecodeError::DataFragment {
                offset: 0,
                needed: 4,
                available: 3
            })
        );
        Ok(())
    }

    #[test]
    fn test_varuint_and_bool() -> Result<()> {
        brine_testhelpers::setup();
        for value in [0, 1, 127, 128, 300, u64::MAX] {
            round_trip(&jars::varuint(), value)?;
        }
        round_trip(&jars::boolean(), true)?;
        assert!(matches!(
            jars::boolean().decode(Window::new(&[2])),
            Err(DecodeError::InvalidBool { offset: 0, value: 2 })
        ));
        Ok(())
    }
}

// ============================================================================
// Text and constants
// ============================================================================

mod text {
    use super::*;

    #[test]
    fn test_text_takes_the_rest() -> Result<()> {
        brine_testhelpers::setup();
        round_trip(&jars::utf8(), "grüße".to_string())?;
        round_trip(&jars::latin1(), "café".to_string())?;
        round_trip(&jars::ascii(), String::new())?;
        assert!(!jars::utf8().meta().can_be_followed());
        Ok(())
    }

    #[test]
    fn test_text_rejects_foreign_characters() {
        brine_testhelpers::setup();
        assert!(matches!(
            jars::ascii().encode(&"naïve".to_string()),
            Err(EncodeError::InvalidText { position: 2, .. })
        ));
        assert!(matches!(
            jars::utf8().decode(Window::new(&[b'a', 0xff])),
            Err(DecodeError::InvalidText { offset: 1, .. })
        ));
    }

    #[test]
    fn test_constant_reads_nothing() -> Result<()> {
        brine_testhelpers::setup();
        let jar = jars::constant(7u8);
        assert_eq!(jar.decode(Window::new(&[1, 2]))?, Parsed::new(7, 0));
        assert_eq!(jar.encode(&7)?, Vec::<u8>::new());
        assert_eq!(jar.encode(&8), Err(EncodeError::ConstantMismatch));
        Ok(())
    }
}

// ============================================================================
// Repetition
// ============================================================================

mod repetition {
    use super::*;

    #[test]
    fn test_until_end_recovers_every_item() -> Result<()> {
        brine_testhelpers::setup();
        let jar = jars::u16_be().repeat_until_end()?;
        let items: Vec<u16> = (0..17).map(|i| i * 3).collect();
        let bytes = jar.encode(&items)?;
        assert_eq!(jar.decode(Window::new(&bytes))?.value, items);

        let mut stray = bytes.clone();
        stray.push(0);
        assert_eq!(
            jar.decode(Window::new(&stray)),
            Err(DecodeError::DataFragment {
                offset: bytes.len(),
                needed: 2,
                available: 1
            })
        );
        Ok(())
    }

    #[test]
    fn test_until_end_with_variable_items() -> Result<()> {
        brine_testhelpers::setup();
        let jar = jars::varuint().repeat_until_end()?;
        round_trip(&jar, vec![1, 1_000, 1_000_000, 0])?;
        assert!(!jar.meta().can_be_followed());
        Ok(())
    }

    #[test]
    fn test_until_end_stops_on_a_stalled_item() -> Result<()> {
        brine_testhelpers::setup();
        let jar = jars::constant(()).repeat_until_end()?;
        assert_eq!(
            jar.decode(Window::new(&[1])),
            Err(DecodeError::NoProgress { offset: 0 })
        );
        assert_eq!(jar.decode(Window::new(&[]))?.value, Vec::<()>::new());
        Ok(())
    }

    #[test]
    fn test_count_prefix_cannot_outgrow_the_input() -> Result<()> {
        brine_testhelpers::setup();
        let jar = jars::constant(()).repeat_counted(jars::u32_be())?;
        assert_eq!(
            jar.decode(Window::new(&[0x10, 0, 0, 0])),
            Err(DecodeError::NoProgress { offset: 4 })
        );
        assert_eq!(jar.decode(Window::new(&[0, 0, 0, 0]))?.value, Vec::<()>::new());

        let padded = jars::constant(()).repeat_counted(jars::u8())?;
        assert_eq!(padded.decode(Window::new(&[2, 0xaa, 0xbb]))?, Parsed::new(vec![(), ()], 1));
        Ok(())
    }

    #[test]
    fn test_counted_and_fixed() -> Result<()> {
        brine_testhelpers::setup();
        let names = jars::utf8().null_terminated().repeat_counted(jars::varuint())?;
        round_trip(&names, vec!["a".to_string(), String::new(), "xyz".to_string()])?;

        let triple = jars::i16_be().repeat(3)?;
        round_trip(&triple, vec![-1, 0, 1])?;
        assert_eq!(triple.meta().constant_length(), Some(6));
        assert_eq!(
            triple.encode(&vec![1, 2]),
            Err(EncodeError::CountMismatch {
                expected: 3,
                actual: 2
            })
        );
        Ok(())
    }

    #[test]
    fn test_arrays() -> Result<()> {
        brine_testhelpers::setup();
        round_trip(&jars::f32_ne().array::<3>()?, [1.0, -2.5, 0.125])?;
        round_trip(&jars::u32_be().array::<2>()?, [1, 2])?;
        Ok(())
    }
}

// ============================================================================
// Framing
// ============================================================================

mod framing {
    use super::*;

    #[test]
    fn test_size_prefixed_round_trip() -> Result<()> {
        brine_testhelpers::setup();
        let jar = jars::utf8().size_prefixed(jars::u32_le());
        round_trip(&jar, "framed".to_string())?;
        let inclusive = jars::utf8()
            .size_prefixed(jars::u16_be())
            .include_prefix(true);
        assert_eq!(inclusive.encode(&"ab".to_string())?, [0, 4, b'a', b'b']);
        round_trip(&inclusive, "ab".to_string())?;
        Ok(())
    }

    #[test]
    fn test_self_referential_size_is_undefined() {
        brine_testhelpers::setup();
        let jar = jars::utf8()
            .size_prefixed(jars::varuint())
            .include_prefix(true);
        assert!(matches!(
            jar.encode(&"x".repeat(127)),
            Err(EncodeError::UndefinedSize { .. })
        ));
        assert!(jar.encode(&"x".repeat(126)).is_ok());
    }

    #[test]
    fn test_null_terminated_frames_a_terminal_codec() -> Result<()> {
        brine_testhelpers::setup();
        let pair = jars::utf8().null_terminated().then(jars::u8())?;
        round_trip(&pair, ("tag".to_string(), 9))?;
        Ok(())
    }

    #[test]
    fn test_constraints_apply_both_ways() -> Result<()> {
        brine_testhelpers::setup();
        let even = jars::u8().where_("even", |v| v % 2 == 0);
        round_trip(&even, 4)?;
        assert!(matches!(
            even.decode(Window::new(&[3])),
            Err(DecodeError::Constraint { .. })
        ));
        assert!(matches!(even.encode(&5), Err(EncodeError::Constraint { .. })));
        Ok(())
    }
}
