//! Digit-validation checksums for structured identifiers
//!
//! A structural match whose checksum fails is discarded outright rather
//! than down-weighted, so later pipeline stages never see arithmetic
//! false positives.

/// Luhn check for payment card numbers
///
/// Doubles every second digit counting from the rightmost, subtracts 9
/// where the result exceeds 9; the total must be divisible by 10.
/// `digits` must contain decimal digits only.
pub fn luhn_valid(digits: &str) -> bool {
    if digits.len() < 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let mut d = u32::from(b - b'0');
            if i % 2 == 1 {
                d *= 2;
                if d > 9 {
                    d -= 9;
                }
            }
            d
        })
        .sum();

    sum % 10 == 0
}

/// Mod-97 check for IBANs
///
/// Moves the leading four characters to the end, converts letters to
/// two-digit numbers (A=10 .. Z=35), and requires the resulting decimal
/// value mod 97 to equal 1. The modulus is computed incrementally so no
/// big-integer arithmetic is needed.
pub fn iban_valid(candidate: &str) -> bool {
    if candidate.len() < 15 || candidate.len() > 34 {
        return false;
    }

    let bytes = candidate.as_bytes();
    if !bytes[0].is_ascii_uppercase()
        || !bytes[1].is_ascii_uppercase()
        || !bytes[2].is_ascii_digit()
        || !bytes[3].is_ascii_digit()
    {
        return false;
    }

    let rearranged = bytes[4..].iter().chain(bytes[..4].iter());
    let mut rem: u32 = 0;
    for &b in rearranged {
        match b {
            b'0'..=b'9' => {
                rem = (rem * 10 + u32::from(b - b'0')) % 97;
            }
            b'A'..=b'Z' => {
                rem = (rem * 100 + u32::from(b - b'A') + 10) % 97;
            }
            _ => return false,
        }
    }

    rem == 1
}
