//! Solidity calldata for the generated Groth16 verifier
//!
//! The verifier contract takes `(uint[2] pA, uint[2][2] pB, uint[2] pC,
//! uint[n] pubSignals)`. The layout is pinned here and by tests because a
//! wrong order yields a proof that silently fails on-chain:
//!
//! - `pA = [a.x, a.y]`, `pC = [c.x, c.y]`
//! - `pB = [[b.x.c1, b.x.c0], [b.y.c1, b.y.c0]]`: each G2 coordinate with
//!   the imaginary part first, the reverse of `proof.json`
//! - `pubSignals` in circuit order
//!
//! Every value is a `0x`-prefixed, zero-padded 32-byte hex string, as
//! emitted by `snarkjs zkey export soliditycalldata`.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::FieldElement;
use crate::types::Groth16Proof;

/// Fixed-shape verifier arguments
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolidityCalldata {
    pub p_a: [String; 2],
    pub p_b: [[String; 2]; 2],
    pub p_c: [String; 2],
    pub pub_signals: Vec<String>,
}

impl SolidityCalldata {
    /// Format a proof and its public signals
    pub fn from_proof(proof: &Groth16Proof, public_signals: &[FieldElement]) -> Result<Self> {
        let [a_x, a_y, _] = &proof.pi_a;
        let [b_x, b_y, _] = &proof.pi_b;
        let [c_x, c_y, _] = &proof.pi_c;

        Ok(Self {
            p_a: [word(a_x)?, word(a_y)?],
            p_b: [[word(&b_x[1])?, word(&b_x[0])?], [word(&b_y[1])?, word(&b_y[0])?]],
            p_c: [word(c_x)?, word(c_y)?],
            pub_signals: public_signals.iter().map(FieldElement::to_hex).collect(),
        })
    }

    /// Parse the text form produced by snarkjs (and [`to_snarkjs_string`](Self::to_snarkjs_string))
    ///
    /// The text is four comma-separated JSON arrays without an outer bracket.
    pub fn parse(text: &str) -> Result<Self> {
        type Shape = ([String; 2], [[String; 2]; 2], [String; 2], Vec<String>);

        let (p_a, p_b, p_c, pub_signals): Shape = serde_json::from_str(&format!("[{}]", text.trim()))
            .map_err(|e| Error::Calldata(format!("unexpected layout: {e}")))?;

        let calldata = Self {
            p_a,
            p_b,
            p_c,
            pub_signals,
        };
        calldata.validate()?;
        Ok(calldata)
    }

    /// snarkjs text form: `[pA],[[pB0],[pB1]],[pC],[pubSignals]`
    pub fn to_snarkjs_string(&self) -> String {
        let quote = |s: &String| format!("\"{s}\"");
        let pair = |p: &[String; 2]| format!("[{}, {}]", quote(&p[0]), quote(&p[1]));
        let signals: Vec<String> = self.pub_signals.iter().map(quote).collect();

        format!(
            "{},[{},{}],{},[{}]",
            pair(&self.p_a),
            pair(&self.p_b[0]),
            pair(&self.p_b[1]),
            pair(&self.p_c),
            signals.join(",")
        )
    }

    /// Public signals decoded back into field elements
    pub fn public_signals(&self) -> Result<Vec<FieldElement>> {
        self.pub_signals.iter().map(|s| FieldElement::from_hex(s)).collect()
    }

    /// Check every entry is a 32-byte `0x` hex word and signals are field elements
    pub fn validate(&self) -> Result<()> {
        let points = self
            .p_a
            .iter()
            .chain(self.p_b.iter().flatten())
            .chain(self.p_c.iter());
        for value in points {
            check_word(value)?;
        }
        for signal in &self.pub_signals {
            check_word(signal)?;
            FieldElement::from_hex(signal).map_err(|e| Error::Calldata(e.to_string()))?;
        }
        Ok(())
    }
}

/// Decimal coordinate to a 32-byte hex word
fn word(decimal: &str) -> Result<String> {
    let value: BigUint = decimal
        .trim()
        .parse()
        .map_err(|_| Error::Calldata(format!("coordinate {decimal:?} is not a decimal integer")))?;
    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        return Err(Error::Calldata(format!("coordinate {decimal} exceeds 256 bits")));
    }
    let mut padded = [0u8; 32];
    padded[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(format!("0x{}", hex::encode(padded)))
}

fn check_word(value: &str) -> Result<()> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| Error::Calldata(format!("{value:?} is not 0x-prefixed")))?;
    if digits.len() != 64 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::Calldata(format!("{value:?} is not a 32-byte hex word")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proof() -> Groth16Proof {
        Groth16Proof::from_affine(
            ["1".into(), "2".into()],
            [["3".into(), "4".into()], ["5".into(), "6".into()]],
            ["7".into(), "8".into()],
        )
    }

    fn w(n: u8) -> String {
        format!("0x{}{:02x}", "0".repeat(62), n)
    }

    #[test]
    fn test_field_order() {
        let calldata =
            SolidityCalldata::from_proof(&proof(), &[FieldElement::from(9u64), FieldElement::from(10u64)]).unwrap();

        assert_eq!(calldata.p_a, [w(1), w(2)]);
        // G2 coordinates swap to (c1, c0)
        assert_eq!(calldata.p_b, [[w(4), w(3)], [w(6), w(5)]]);
        assert_eq!(calldata.p_c, [w(7), w(8)]);
        assert_eq!(calldata.pub_signals, vec![w(9), w(10)]);
    }

    #[test]
    fn test_snarkjs_string_layout() {
        let calldata = SolidityCalldata::from_proof(&proof(), &[FieldElement::from(9u64)]).unwrap();
        let text = calldata.to_snarkjs_string();

        let expected = format!(
            "[\"{}\", \"{}\"],[[\"{}\", \"{}\"],[\"{}\", \"{}\"]],[\"{}\", \"{}\"],[\"{}\"]",
            w(1), w(2), w(4), w(3), w(6), w(5), w(7), w(8), w(9)
        );
        assert_eq!(text, expected);
        assert_eq!(SolidityCalldata::parse(&text).unwrap(), calldata);
    }

    #[test]
    fn test_parse_rejects_wrong_shapes() {
        // pA with three entries
        let text = format!(
            "[\"{0}\",\"{0}\",\"{0}\"],[[\"{0}\",\"{0}\"],[\"{0}\",\"{0}\"]],[\"{0}\",\"{0}\"],[]",
            w(1)
        );
        assert!(matches!(SolidityCalldata::parse(&text), Err(Error::Calldata(_))));

        // pB flattened
        let text = format!("[\"{0}\",\"{0}\"],[\"{0}\",\"{0}\"],[\"{0}\",\"{0}\"],[]", w(1));
        assert!(SolidityCalldata::parse(&text).is_err());

        // missing pubSignals
        let text = format!("[\"{0}\",\"{0}\"],[[\"{0}\",\"{0}\"],[\"{0}\",\"{0}\"]],[\"{0}\",\"{0}\"]", w(1));
        assert!(SolidityCalldata::parse(&text).is_err());
    }

    #[test]
    fn test_parse_rejects_short_words() {
        let text = format!(
            "[\"0x1\",\"{0}\"],[[\"{0}\",\"{0}\"],[\"{0}\",\"{0}\"]],[\"{0}\",\"{0}\"],[]",
            w(1)
        );
        assert!(SolidityCalldata::parse(&text).is_err());
    }

    #[test]
    fn test_public_signals_decode() {
        let signals = vec![FieldElement::from(11u64), FieldElement::from_label("ctx")];
        let calldata = SolidityCalldata::from_proof(&proof(), &signals).unwrap();
        assert_eq!(calldata.public_signals().unwrap(), signals);
    }

    #[test]
    fn test_rejects_non_decimal_coordinate() {
        let mut bad = proof();
        bad.pi_a[0] = "0xabc".into();
        assert!(SolidityCalldata::from_proof(&bad, &[]).is_err());
    }
}
