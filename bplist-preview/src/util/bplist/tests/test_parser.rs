#[cfg(test)]
mod parser_tests {
    use std::rc::Rc;

    use crate::{
        error::bplist::{BinaryPlistError, ErrorKind},
        util::bplist::{
            models::{RawObject, MAX_SAFE_INTEGER},
            parser::{integer_from_be, parse_binary_plist, unsigned_from_be, MAX_DECODE_DEPTH},
            tests::builder::{marker, PlistBuilder},
        },
    };

    fn as_array(object: &RawObject) -> &[Rc<RawObject>] {
        match object {
            RawObject::Array(items) => items,
            other => panic!("expected an array, got {other:?}"),
        }
    }

    #[test]
    fn can_parse_true() {
        let mut builder = PlistBuilder::new();
        let top = builder.bool(true);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        assert_eq!(*result, RawObject::Bool(true));
    }

    #[test]
    fn can_parse_null_and_false() {
        let mut builder = PlistBuilder::new();
        let null = builder.null();
        let no = builder.bool(false);
        let top = builder.array(&[null, no]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        let items = as_array(&result);
        assert_eq!(*items[0], RawObject::Null);
        assert_eq!(*items[1], RawObject::Bool(false));
    }

    #[test]
    fn can_parse_unknown_simple_object() {
        let mut builder = PlistBuilder::new();
        let top = builder.raw(vec![0x05]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        assert!(matches!(&*result, RawObject::Diagnostic(why) if why.contains("0x5")));
    }

    #[test]
    fn can_parse_nested() {
        let mut builder = PlistBuilder::new();
        let one = builder.int(1);
        let a = builder.ascii("a");
        let k = builder.ascii("k");
        let real = builder.real(2.5);
        let dict = builder.dict(&[(k, real)]);
        let top = builder.array(&[one, a, dict]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        let items = as_array(&result);
        assert_eq!(items.len(), 3);
        assert_eq!(*items[0], RawObject::Integer(1));
        assert_eq!(*items[1], RawObject::String("a".to_string()));
        match &*items[2] {
            RawObject::Dictionary(dictionary) => {
                assert_eq!(dictionary.len(), 1);
                assert_eq!(**dictionary.get("k").unwrap(), RawObject::Real(2.5));
            }
            other => panic!("expected a dictionary, got {other:?}"),
        }
    }

    #[test]
    fn can_parse_plist_crate_output() {
        let mut dict = plist::Dictionary::new();
        dict.insert("k".to_string(), plist::Value::Real(2.5));
        dict.insert("uid".to_string(), plist::Value::Uid(plist::Uid::new(300)));
        let value = plist::Value::Array(vec![
            plist::Value::Integer(plist::Integer::from(1i64)),
            plist::Value::String("a".to_string()),
            plist::Value::Dictionary(dict),
            plist::Value::Integer(plist::Integer::from(-7i64)),
            plist::Value::Boolean(false),
        ]);
        let mut bytes = vec![];
        value.to_writer_binary(&mut bytes).unwrap();

        let result = parse_binary_plist(&bytes).unwrap();

        let items = as_array(&result);
        assert_eq!(*items[0], RawObject::Integer(1));
        assert_eq!(*items[1], RawObject::String("a".to_string()));
        match &*items[2] {
            RawObject::Dictionary(dictionary) => {
                assert_eq!(**dictionary.get("k").unwrap(), RawObject::Real(2.5));
                assert_eq!(
                    **dictionary.get("uid").unwrap(),
                    RawObject::Uid("300".to_string())
                );
            }
            other => panic!("expected a dictionary, got {other:?}"),
        }
        assert_eq!(*items[3], RawObject::Integer(-7));
        assert_eq!(*items[4], RawObject::Bool(false));
    }

    #[test]
    fn can_parse_narrow_integers_as_twos_complement() {
        assert_eq!(integer_from_be(&[0x7F]), RawObject::Integer(127));
        assert_eq!(integer_from_be(&[0xFF]), RawObject::Integer(-1));
        assert_eq!(integer_from_be(&[0x80, 0x00]), RawObject::Integer(-32768));
        assert_eq!(
            integer_from_be(&[0xFF, 0xFF, 0xFF, 0xFE]),
            RawObject::Integer(-2)
        );
        assert_eq!(
            integer_from_be(&[0x7F, 0xFF, 0xFF, 0xFF]),
            RawObject::Integer(2_147_483_647)
        );
    }

    #[test]
    fn can_parse_narrow_integer_objects() {
        let mut builder = PlistBuilder::new();
        let byte = builder.raw(vec![0x10, 0xFF]);
        let word = builder.raw(vec![0x12, 0xFF, 0xFF, 0xFF, 0xFE]);
        let top = builder.array(&[byte, word]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        let items = as_array(&result);
        assert_eq!(*items[0], RawObject::Integer(-1));
        assert_eq!(*items[1], RawObject::Integer(-2));
    }

    #[test]
    fn can_parse_signed_integers() {
        assert_eq!(
            integer_from_be(&(-1i64).to_be_bytes()),
            RawObject::Integer(-1)
        );
        assert_eq!(
            integer_from_be(&(MAX_SAFE_INTEGER as i64).to_be_bytes()),
            RawObject::Integer(MAX_SAFE_INTEGER as i64)
        );
        assert_eq!(
            integer_from_be(&(-(MAX_SAFE_INTEGER as i64)).to_be_bytes()),
            RawObject::Integer(-(MAX_SAFE_INTEGER as i64))
        );
    }

    #[test]
    fn can_parse_unsafe_integers_as_exact_text() {
        assert_eq!(
            integer_from_be(&((MAX_SAFE_INTEGER + 1) as i64).to_be_bytes()),
            RawObject::BigInteger("9007199254740992".to_string())
        );
        assert_eq!(
            integer_from_be(&i64::MIN.to_be_bytes()),
            RawObject::BigInteger("-9223372036854775808".to_string())
        );
        assert_eq!(
            integer_from_be(&u128::MAX.to_be_bytes()),
            RawObject::Integer(-1)
        );
        assert_eq!(
            integer_from_be(&(u64::MAX as u128).to_be_bytes()),
            RawObject::BigInteger("18446744073709551615".to_string())
        );
    }

    #[test]
    fn can_parse_wide_integers() {
        // 2^128 in 32 bytes
        let mut bytes = [0u8; 32];
        bytes[15] = 1;
        assert_eq!(
            integer_from_be(&bytes),
            RawObject::BigInteger("340282366920938463463374607431768211456".to_string())
        );

        // -2^128 in 32 bytes
        let mut negative = [0xFFu8; 32];
        negative[16..].fill(0);
        assert_eq!(
            integer_from_be(&negative),
            RawObject::BigInteger("-340282366920938463463374607431768211456".to_string())
        );

        // Sign extension alone does not make a small value big
        let mut small = [0u8; 32];
        small[31] = 42;
        assert_eq!(integer_from_be(&small), RawObject::Integer(42));
        assert_eq!(integer_from_be(&[0xFFu8; 64]), RawObject::Integer(-1));
    }

    #[test]
    fn can_parse_integer_object_of_any_width() {
        let mut builder = PlistBuilder::new();
        let mut bytes = vec![0x15];
        let mut payload = [0u8; 32];
        payload[31] = 7;
        bytes.extend(payload);
        let top = builder.raw(bytes);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        assert_eq!(*result, RawObject::Integer(7));
    }

    #[test]
    fn can_read_unsigned_addresses() {
        assert_eq!(unsigned_from_be(&[0x01, 0x00]), Ok(256));
        assert_eq!(unsigned_from_be(&[0u8; 40]), Ok(0));
        assert_eq!(
            unsigned_from_be(&[0x00, 0x20, 0, 0, 0, 0, 0, 0]),
            Err(BinaryPlistError::UnsafeInteger(1 << 53))
        );
        assert_eq!(
            unsigned_from_be(&[0xFF; 17]),
            Err(BinaryPlistError::Overflow)
        );
    }

    #[test]
    fn can_parse_reals() {
        let mut builder = PlistBuilder::new();
        let mut single = vec![0x22];
        single.extend(1.5f32.to_be_bytes());
        let single = builder.raw(single);
        let double = builder.real(-0.125);
        let half = builder.raw(vec![0x21, 0x3C, 0x00]);
        let top = builder.array(&[single, double, half]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        let items = as_array(&result);
        assert_eq!(*items[0], RawObject::Real(1.5));
        assert_eq!(*items[1], RawObject::Real(-0.125));
        assert!(matches!(&*items[2], RawObject::Diagnostic(why) if why.contains("2 bytes")));
    }

    #[test]
    fn can_parse_dates() {
        let mut builder = PlistBuilder::new();
        let reference = builder.date(0.0);
        let later = builder.date(31_536_000.5);
        let invalid = builder.date(f64::NAN);
        let mut bad_marker = vec![0x32];
        bad_marker.extend(0.0f64.to_be_bytes());
        let bad_marker = builder.raw(bad_marker);
        let top = builder.array(&[reference, later, invalid, bad_marker]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        let items = as_array(&result);
        assert_eq!(
            *items[0],
            RawObject::Date("2001-01-01T00:00:00.000Z".to_string())
        );
        assert_eq!(
            *items[1],
            RawObject::Date("2002-01-01T00:00:00.500Z".to_string())
        );
        assert!(matches!(&*items[2], RawObject::Diagnostic(_)));
        assert!(matches!(&*items[3], RawObject::Diagnostic(_)));
    }

    #[test]
    fn can_parse_large_data() {
        let mut builder = PlistBuilder::new();
        let top = builder.data(&[0xAB; 1000]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        assert_eq!(
            *result,
            RawObject::Data {
                length: 1000,
                preview: format!("{}…", "ab".repeat(64)),
            }
        );
    }

    #[test]
    fn can_parse_strings() {
        let long = "x".repeat(40);
        let mut builder = PlistBuilder::new();
        let short = builder.ascii("hello");
        let fat = builder.ascii(&long);
        let wide = builder.utf16("héllo 😀");
        let empty = builder.ascii("");
        let top = builder.array(&[short, fat, wide, empty]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        let items = as_array(&result);
        assert_eq!(*items[0], RawObject::String("hello".to_string()));
        assert_eq!(*items[1], RawObject::String(long));
        assert_eq!(*items[2], RawObject::String("héllo 😀".to_string()));
        assert_eq!(*items[3], RawObject::String(String::new()));
    }

    #[test]
    fn can_parse_lone_surrogate() {
        let mut builder = PlistBuilder::new();
        let top = builder.raw(vec![0x62, 0xD8, 0x00, 0x00, 0x41]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        assert_eq!(*result, RawObject::String("\u{FFFD}A".to_string()));
    }

    #[test]
    fn can_parse_uids() {
        let mut builder = PlistBuilder::new();
        let small = builder.uid(5, 1);
        let huge = builder.uid(u128::MAX, 16);
        let top = builder.array(&[small, huge]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        let items = as_array(&result);
        assert_eq!(*items[0], RawObject::Uid("5".to_string()));
        assert_eq!(*items[1], RawObject::Uid(u128::MAX.to_string()));
    }

    #[test]
    fn can_parse_dictionary_with_repeated_keys() {
        let mut builder = PlistBuilder::new();
        let a = builder.ascii("a");
        let b = builder.ascii("b");
        let one = builder.int(1);
        let two = builder.int(2);
        let three = builder.int(3);
        let top = builder.dict(&[(a, one), (b, two), (a, three)]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        match &*result {
            RawObject::Dictionary(dictionary) => {
                let keys: Vec<&str> = dictionary.iter().map(|(key, _)| key).collect();
                assert_eq!(keys, vec!["a", "b"]);
                assert_eq!(**dictionary.get("a").unwrap(), RawObject::Integer(3));
            }
            other => panic!("expected a dictionary, got {other:?}"),
        }
    }

    #[test]
    fn can_parse_dictionary_with_non_string_keys() {
        let mut builder = PlistBuilder::new();
        let seven = builder.int(7);
        let yes = builder.bool(true);
        let value = builder.ascii("v");
        let top = builder.dict(&[(seven, value), (yes, value)]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        match &*result {
            RawObject::Dictionary(dictionary) => {
                let keys: Vec<&str> = dictionary.iter().map(|(key, _)| key).collect();
                assert_eq!(keys, vec!["7", "true"]);
            }
            other => panic!("expected a dictionary, got {other:?}"),
        }
    }

    #[test]
    fn can_parse_self_reference() {
        let mut builder = PlistBuilder::new();
        let own = builder.next_index();
        let top = builder.array(&[own]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        assert_eq!(*as_array(&result)[0], RawObject::Circular(0));
    }

    #[test]
    fn can_parse_indirect_cycle() {
        let mut builder = PlistBuilder::new();
        let key = builder.ascii("child");
        let dict_index = builder.next_index() + 1;
        let array = builder.array(&[dict_index]);
        let top = builder.dict(&[(key, array)]);
        assert_eq!(top, dict_index);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        match &*result {
            RawObject::Dictionary(dictionary) => {
                let child = dictionary.get("child").unwrap();
                assert_eq!(
                    *as_array(child)[0],
                    RawObject::Circular(dict_index as usize)
                );
            }
            other => panic!("expected a dictionary, got {other:?}"),
        }
    }

    #[test]
    fn can_share_memoized_objects() {
        let mut builder = PlistBuilder::new();
        let shared = builder.ascii("shared");
        let top = builder.array(&[shared, shared]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        let items = as_array(&result);
        assert!(Rc::ptr_eq(&items[0], &items[1]));
    }

    #[test]
    fn can_continue_past_unsupported_type() {
        let mut builder = PlistBuilder::new();
        let unknown = builder.raw(vec![0x70]);
        let one = builder.int(1);
        let top = builder.array(&[unknown, one]);

        let result = parse_binary_plist(&builder.build(top)).unwrap();

        let items = as_array(&result);
        assert!(matches!(&*items[0], RawObject::Diagnostic(why) if why.contains("0x7")));
        assert_eq!(*items[1], RawObject::Integer(1));
    }

    #[test]
    fn can_limit_decode_depth() {
        let mut builder = PlistBuilder::new();
        let mut current = builder.int(0);
        for _ in 0..MAX_DECODE_DEPTH + 100 {
            current = builder.array(&[current]);
        }

        let result = parse_binary_plist(&builder.build(current)).unwrap();

        let mut depth = 0;
        let mut object = result;
        while let RawObject::Array(items) = &*object {
            let next = Rc::clone(&items[0]);
            object = next;
            depth += 1;
        }
        assert_eq!(depth, MAX_DECODE_DEPTH);
        assert!(matches!(&*object, RawObject::Diagnostic(_)));
    }

    #[test]
    fn cant_parse_offset_into_trailer() {
        let mut builder = PlistBuilder::new();
        let top = builder.bool(true);
        let mut bytes = builder.build(top);
        let trailer_start = bytes.len() - 32;
        // The single one byte offset table entry sits right before the trailer
        bytes[trailer_start - 1] = trailer_start as u8;

        let result = parse_binary_plist(&bytes).unwrap_err();

        assert_eq!(
            result,
            BinaryPlistError::InvalidOffset(0, trailer_start as u64)
        );
        assert_eq!(result.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn cant_parse_offset_into_header() {
        let mut builder = PlistBuilder::new();
        let top = builder.bool(true);
        let mut bytes = builder.build(top);
        let trailer_start = bytes.len() - 32;
        bytes[trailer_start - 1] = 3;

        let result = parse_binary_plist(&bytes).unwrap_err();

        assert_eq!(result.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn cant_parse_reference_past_object_count() {
        let mut builder = PlistBuilder::new();
        let top = builder.array(&[9]);

        let result = parse_binary_plist(&builder.build(top)).unwrap_err();

        assert_eq!(result, BinaryPlistError::InvalidReference(9, 1));
        assert_eq!(result.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn cant_parse_truncated_string() {
        let mut builder = PlistBuilder::new();
        let mut bytes = marker(0x5, 200);
        bytes.extend(b"short");
        let top = builder.raw(bytes);

        let result = parse_binary_plist(&builder.build(top)).unwrap_err();

        assert!(matches!(result, BinaryPlistError::OutOfBounds(..)));
        assert_eq!(result.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn cant_parse_huge_array_length() {
        let mut builder = PlistBuilder::new();
        let top = builder.raw(marker(0xA, 1 << 40));

        let result = parse_binary_plist(&builder.build(top)).unwrap_err();

        assert_eq!(result.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn cant_parse_unsafe_length() {
        let mut builder = PlistBuilder::new();
        let mut bytes = vec![0x4F, 0x13];
        bytes.extend(u64::MAX.to_be_bytes());
        let top = builder.raw(bytes);

        let result = parse_binary_plist(&builder.build(top)).unwrap_err();

        assert_eq!(result, BinaryPlistError::UnsafeInteger(u64::MAX as u128));
        assert_eq!(result.kind(), ErrorKind::Range);
    }

    #[test]
    fn cant_parse_non_integer_length_marker() {
        let mut builder = PlistBuilder::new();
        let top = builder.raw(vec![0x5F, 0x51, b'a']);

        let result = parse_binary_plist(&builder.build(top)).unwrap_err();

        assert_eq!(result, BinaryPlistError::InvalidLengthMarker(0x51));
        assert_eq!(result.kind(), ErrorKind::Format);
    }

    #[test]
    fn can_parse_idempotently() {
        let mut builder = PlistBuilder::new();
        let key = builder.ascii("k");
        let value = builder.data(&[1, 2, 3]);
        let top = builder.dict(&[(key, value)]);
        let bytes = builder.build(top);

        let first = parse_binary_plist(&bytes).unwrap();
        let second = parse_binary_plist(&bytes).unwrap();

        assert_eq!(first, second);
    }
}
