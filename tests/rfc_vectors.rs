//! Published test vectors driven through the public operations.

use s390x_ecc::{ecdh, ecdsa_sign, ecdsa_verify, x25519_derive_pub, x448_derive_pub};
use s390x_ecc::{ed25519_derive_pub, ed448_derive_pub};
use s390x_ecc::{Capabilities, Counters, Curve, EcKey, Error};

fn caps() -> Capabilities {
    Capabilities { msa9_switch: true, ..Capabilities::default() }
}

fn unhex(s: &str) -> Vec<u8> {
    hex::decode(s).unwrap()
}

#[test]
fn x25519_scalar_multiplication_matches_rfc7748_section_5_2() {
    let scalar = unhex("a546e36bf0527c9d3b16154b82465edd62144c0ac1fc5a18506a2244ba449ac4");
    let u = unhex("e6db6867583030db3594c1a424b15f7c726624ec26b3353b10a903a6d0ab1c4c");
    let expected = unhex("c3da55379de9c6908e94ea4df28d084f32eccf03491c71f754b4075577a28552");

    let key = EcKey::new(Curve::X25519).with_private(&scalar).unwrap();
    let z = ecdh(&caps(), &Counters::default(), Curve::X25519, &key, &u, &[]).unwrap();
    assert_eq!(z, expected);
}

#[test]
fn x448_scalar_multiplication_matches_rfc7748_section_5_2() {
    let scalar = unhex(
        "3d262fddf9ec8e88495266fea19a34d28882acef045104d0d1aae121700a779c984c24f8cdd78fbff44943eba368f54b29259a4f1c600ad3",
    );
    let u = unhex(
        "06fce640fa3487bfda5f6cf2d5263f8aad88334cbd07437f020f08f9814dc031ddbdc38c19c6da2583fa5429db94ada18aa7a7fb4ef8a086",
    );
    let expected = unhex(
        "ce3e4ff95a60dc6697da1db1d85e6afbdf79b50a2412d7546d5f239fe14fbaadeb445fc66a01b0779d98223961111e21766282f73dd96b6f",
    );

    let key = EcKey::new(Curve::X448).with_private(&scalar).unwrap();
    let z = ecdh(&caps(), &Counters::default(), Curve::X448, &key, &u, &[]).unwrap();
    assert_eq!(z, expected);
}

#[test]
fn x25519_public_key_derivation_matches_rfc7748_section_6_1() {
    let alice_priv = unhex("77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a");
    let alice_pub = unhex("8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a");

    assert_eq!(x25519_derive_pub(&caps(), &Counters::default(), &alice_priv).unwrap(), alice_pub);
}

#[test]
fn x448_public_key_derivation_matches_rfc7748_section_6_2() {
    let alice_priv = unhex(
        "9a8f4925d1519f5775cf46b04b5800d4ee9ee8bae8bc5565d498c28dd9c9baf574a9419744897391006382a6f127ab1d9ac2d8c0a598726b",
    );
    let alice_pub = unhex(
        "9b08f7cc31b7e3e67d22d5aea121074a273bd2b83de09c63faa73d2c22c5d9bbc836647241d953d40c5b12da88120d53177f80e532c41fa0",
    );

    assert_eq!(x448_derive_pub(&caps(), &Counters::default(), &alice_priv).unwrap(), alice_pub);
}

#[test]
fn ed25519_public_key_derivation_matches_rfc8032_test_1() {
    let seed = unhex("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60");
    let expected = unhex("d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a");

    assert_eq!(ed25519_derive_pub(&caps(), &Counters::default(), &seed).unwrap(), expected);
}

#[test]
fn ed448_public_key_derivation_matches_rfc8032_blank_test() {
    let seed = unhex(
        "6c82a562cb808d10d632be89c8513ebf6c929f34ddfa8c9f63c9960ef6e348a3528c8a3fcc2f044e39a3fc5b94492f8f032e7549a20098f95b",
    );
    let expected = unhex(
        "5fd7449b59b461fd2ce787ec616ad46a1da1342485a70e1f8a0ea75d80e96778edf124769b46c7061bd6783df1e50f6cd1fa1abeafe8256180",
    );

    assert_eq!(ed448_derive_pub(&caps(), &Counters::default(), &seed).unwrap(), expected);
}

#[test]
fn p256_deterministic_signature_matches_rfc6979_sample() {
    let d = unhex("c9afa9d845ba75166b5c215767b1d6934e50c3db36e89b127b8a622b120f6721");
    let pub_x = unhex("60fed4ba255a9d31c961eb74c6356d68c049b8923b61fa6ce669622e60f29fb6");
    let pub_y = unhex("7903fe1008b8bc99a41ae9e95628bc64f2f1b20c2d7e9f5177a3c294d4462299");

    // SHA-256("sample").
    let hash = unhex("af2bdbe1aa9b6ec1e2ade1d694f41fc71a831d0268e9891562113d8a62add1bf");
    // RFC 6979 A.2.5 nonce for that message.
    let k = unhex("a6e3c57dd01abe90086538398355dd4c3b17aa873382b0f24d6129493d8aad60");
    let expected_r = unhex("efd48b2aacb6a8fd1140dd9cd45e81d69d2c877b56aaf991c34d0ea84eaf3716");
    let expected_s = unhex("f7cb1c942d657c41d436c7a1b6e29f65f3e900dbb9aff4064dc4ab2f843acda8");

    let counters = Counters::default();
    let priv_key = EcKey::new(Curve::P256).with_private(&d).unwrap();
    let mut fixed_k = |out: &mut [u8]| out.copy_from_slice(&k);

    let (r, s) = ecdsa_sign(&caps(), &counters, Curve::P256, &priv_key, &hash, Some(&mut fixed_k)).unwrap();
    assert_eq!(r, expected_r);
    assert_eq!(s, expected_s);

    let pub_key = EcKey::new(Curve::P256).with_public(&pub_x, &pub_y).unwrap();
    ecdsa_verify(&caps(), &counters, Curve::P256, &pub_key, &hash, &r, &s).unwrap();

    // A single flipped bit in r must read as a rejected signature, not
    // as a transport fault.
    let mut bad_r = r;
    bad_r[0] ^= 0x08;
    let err = ecdsa_verify(&caps(), &counters, Curve::P256, &pub_key, &hash, &bad_r, &s).unwrap_err();
    assert!(matches!(err, Error::SignatureInvalid));
    assert_eq!(err.errno(), libc::EFAULT);
}

#[test]
fn deterministic_signatures_are_stable_across_invocations() {
    let d = unhex("c9afa9d845ba75166b5c215767b1d6934e50c3db36e89b127b8a622b120f6721");
    let hash = unhex("af2bdbe1aa9b6ec1e2ade1d694f41fc71a831d0268e9891562113d8a62add1bf");
    let k = unhex("a6e3c57dd01abe90086538398355dd4c3b17aa873382b0f24d6129493d8aad60");

    let counters = Counters::default();
    let priv_key = EcKey::new(Curve::P256).with_private(&d).unwrap();

    let mut rng_a = |out: &mut [u8]| out.copy_from_slice(&k);
    let mut rng_b = |out: &mut [u8]| out.copy_from_slice(&k);
    let sig_a = ecdsa_sign(&caps(), &counters, Curve::P256, &priv_key, &hash, Some(&mut rng_a)).unwrap();
    let sig_b = ecdsa_sign(&caps(), &counters, Curve::P256, &priv_key, &hash, Some(&mut rng_b)).unwrap();

    assert_eq!(sig_a, sig_b);
}

#[test]
fn p521_base_point_multiplication_by_one_keeps_full_width_padding() {
    // Scalar 1 maps the generator to itself; the reply buffers must hold
    // all 66 bytes including the generator's leading zero byte.
    let gx = unhex(
        "00c6858e06b70404e9cd9e3ecb662395b4429c648139053fb521f828af606b4d3dbaa14b5e77efe75928fe1dc127a2ffa8de3348b3c1856a429bf97e7e31c2e5bd66",
    );
    let gy = unhex(
        "011839296a789a3bc0045c8a5fb42c7d1bd998f54449579b446817afbd17273e662c97ee72995ef42640c550b9013fad0761353c7086a272c24088be94769fd16650",
    );

    let key = EcKey::new(Curve::P521).with_private(&[0x01]).unwrap();
    assert_eq!(key.d.as_ref().unwrap().len(), 66);

    let z = ecdh(&caps(), &Counters::default(), Curve::P521, &key, &gx, &gy).unwrap();
    assert_eq!(z.len(), 66);
    assert_eq!(z, gx);
    assert_eq!(z[0], 0x00);
}
