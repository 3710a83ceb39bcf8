// HD wallet core: key derivation, address codecs & gap-limit accounts.
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2020-2024 by
//     Dr Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// Copyright (C) 2020-2024 LNP/BP Standards Association. All rights reserved.
// Copyright (C) 2020-2024 Dr Maxim Orlovsky. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Group operations on secp256k1 used by the key derivation.
//!
//! The arithmetic itself is performed by libsecp256k1; this module only adds
//! an explicit point at infinity, which the library can't represent.

use secp256k1::{PublicKey, SecretKey, SECP256K1};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum CurveError {
    /// scalar is not less than the secp256k1 group order.
    ScalarOutOfRange,

    /// there is no point on secp256k1 with the given x coordinate.
    NotOnCurve,

    /// point at infinity has no serialization.
    Infinity,
}

/// Point of the secp256k1 group.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Point {
    /// Identity element of the group.
    Infinity,
    /// Any other point, stored in the libsecp256k1 representation.
    Affine(PublicKey),
}

impl From<PublicKey> for Point {
    fn from(pk: PublicKey) -> Self { Point::Affine(pk) }
}

impl Point {
    #[inline]
    pub fn is_infinity(&self) -> bool { matches!(self, Point::Infinity) }

    /// Returns the point as a public key, which fails for infinity.
    pub fn to_public_key(self) -> Result<PublicKey, CurveError> {
        match self {
            Point::Infinity => Err(CurveError::Infinity),
            Point::Affine(pk) => Ok(pk),
        }
    }

    /// Computes `P + Q`.
    pub fn add(self, other: Point) -> Point {
        match (self, other) {
            (Point::Infinity, q) => q,
            (p, Point::Infinity) => p,
            // libsecp256k1 refuses to combine into infinity, which happens
            // only for `P + (-P)`
            (Point::Affine(p), Point::Affine(q)) => {
                p.combine(&q).map(Point::Affine).unwrap_or(Point::Infinity)
            }
        }
    }

    /// Computes `k·G` for a big-endian scalar `k`.
    pub fn mul_generator(k: [u8; 32]) -> Result<Point, CurveError> {
        if k == [0u8; 32] {
            return Ok(Point::Infinity);
        }
        let sk = SecretKey::from_slice(&k).map_err(|_| CurveError::ScalarOutOfRange)?;
        Ok(Point::Affine(PublicKey::from_secret_key(SECP256K1, &sk)))
    }

    /// Recovers the point with the given x coordinate and y parity.
    pub fn decompress(x: [u8; 32], odd: bool) -> Result<Point, CurveError> {
        let mut data = [0u8; 33];
        data[0] = if odd { 0x03 } else { 0x02 };
        data[1..].copy_from_slice(&x);
        PublicKey::from_slice(&data).map(Point::Affine).map_err(|_| CurveError::NotOnCurve)
    }

    /// SEC1 compressed form; `None` for infinity.
    pub fn serialize(&self) -> Option<[u8; 33]> {
        match self {
            Point::Infinity => None,
            Point::Affine(pk) => Some(pk.serialize()),
        }
    }
}

#[cfg(test)]
mod test {
    use amplify::hex::FromHex;

    use super::*;

    fn scalar(n: u8) -> [u8; 32] {
        let mut k = [0u8; 32];
        k[31] = n;
        k
    }

    const GENERATOR_X: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn generator() {
        let g = Point::mul_generator(scalar(1)).unwrap();
        let mut x = [0u8; 32];
        x.copy_from_slice(&Vec::<u8>::from_hex(GENERATOR_X).unwrap());
        // y of G is even
        assert_eq!(Point::decompress(x, false).unwrap(), g);
        assert_ne!(Point::decompress(x, true).unwrap(), g);
    }

    #[test]
    fn addition_matches_multiplication() {
        let g = Point::mul_generator(scalar(1)).unwrap();
        let g2 = Point::mul_generator(scalar(2)).unwrap();
        let g3 = Point::mul_generator(scalar(3)).unwrap();
        assert_eq!(g.add(g), g2);
        assert_eq!(g.add(g2), g3);
        assert_eq!(Point::Infinity.add(g), g);
        assert_eq!(g3.add(Point::Infinity), g3);
    }

    #[test]
    fn infinity() {
        assert_eq!(Point::mul_generator([0u8; 32]), Ok(Point::Infinity));
        let Point::Affine(g) = Point::mul_generator(scalar(1)).unwrap() else {
            panic!("generator is infinity")
        };
        assert_eq!(Point::Affine(g).add(Point::Affine(g.negate(SECP256K1))), Point::Infinity);
        assert_eq!(Point::Infinity.serialize(), None);
        assert_eq!(Point::Infinity.to_public_key(), Err(CurveError::Infinity));
    }

    #[test]
    fn out_of_range() {
        assert_eq!(Point::mul_generator([0xFF; 32]), Err(CurveError::ScalarOutOfRange));
        // x = 5 has no square root of x^3 + 7 on secp256k1
        assert_eq!(Point::decompress(scalar(5), false), Err(CurveError::NotOnCurve));
    }
}
