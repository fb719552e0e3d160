// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

/// Helper for converting an evaluated number to a count, or a suitable error.
pub fn num_to_int<T>(inp: f64, min: u32, max: u32, err: impl FnOnce(f64) -> T) -> Result<u32, T> {
    let v = inp.round();
    if (v - inp).abs() < 0.0001 && v >= min as f64 && v <= max as f64 {
        Ok(v as u32)
    } else {
        Err(err(inp))
    }
}

#[cfg(test)]
mod tests {
    use super::num_to_int;

    #[test]
    fn counts() {
        assert_eq!(num_to_int(4.0, 3, 12, |v| v), Ok(4));
        assert_eq!(num_to_int(3.99999, 3, 12, |v| v), Ok(4));
        assert_eq!(num_to_int(4.5, 3, 12, |v| v), Err(4.5));
        assert_eq!(num_to_int(13.0, 3, 12, |v| v), Err(13.0));
        assert_eq!(num_to_int(-1.0, 0, 12, |v| v), Err(-1.0));
    }
}
