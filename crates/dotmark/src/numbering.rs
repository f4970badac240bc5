//! Numbering formats, such as `1.1.a`, applied to section locations.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Decimal,
    Alphabetic { uppercase: bool },
    Roman { uppercase: bool },
}

impl Counter {
    /// Formats `n`. Values outside the counter's range fall back to decimal.
    pub fn format(&self, n: usize) -> String {
        match self {
            Counter::Alphabetic { uppercase } if (1..=26).contains(&n) => {
                let base = if *uppercase { b'A' } else { b'a' };
                ((base + (n - 1) as u8) as char).to_string()
            }
            Counter::Roman { uppercase } if (1..=3999).contains(&n) => {
                let roman = roman(n);
                if *uppercase {
                    roman
                } else {
                    roman.to_lowercase()
                }
            }
            _ => n.to_string(),
        }
    }
}

fn roman(mut n: usize) -> String {
    const NUMERALS: [(usize, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberingSymbol {
    Fixed(char),
    Counter(Counter),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingFormat {
    pub symbols: Vec<NumberingSymbol>,
}

impl NumberingFormat {
    /// `1` is a decimal counter, `a`/`A` alphabetic and `i`/`I` roman. Anything else is kept
    /// as is.
    pub fn parse(format: &str) -> Self {
        let symbols = format
            .chars()
            .map(|c| match c {
                '1' => NumberingSymbol::Counter(Counter::Decimal),
                'a' => NumberingSymbol::Counter(Counter::Alphabetic { uppercase: false }),
                'A' => NumberingSymbol::Counter(Counter::Alphabetic { uppercase: true }),
                'i' => NumberingSymbol::Counter(Counter::Roman { uppercase: false }),
                'I' => NumberingSymbol::Counter(Counter::Roman { uppercase: true }),
                c => NumberingSymbol::Fixed(c),
            })
            .collect();
        NumberingFormat { symbols }
    }

    pub fn counter_count(&self) -> usize {
        self.symbols
            .iter()
            .filter(|s| matches!(s, NumberingSymbol::Counter(_)))
            .count()
    }

    /// Formats a location, one level per counter. Fixed symbols only appear between counters
    /// that are printed. With `strict`, a location deeper than the format yields an empty
    /// string; otherwise the excess levels are ignored.
    pub fn format(&self, location: &[usize], strict: bool) -> String {
        if strict && location.len() > self.counter_count() {
            return String::new();
        }

        let mut out = String::new();
        let mut pending = String::new();
        let mut levels = location.iter();
        for symbol in &self.symbols {
            match symbol {
                NumberingSymbol::Fixed(c) => pending.push(*c),
                NumberingSymbol::Counter(counter) => match levels.next() {
                    Some(level) => {
                        out.push_str(&pending);
                        pending.clear();
                        out.push_str(&counter.format(*level));
                    }
                    None => return out,
                },
            }
        }
        out.push_str(&pending);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! format_tests {
        ($($name:ident: $value:expr,)*) => {
        $(
            paste::item! {
            #[test]
            fn [<format_ $name>]() {
                let (format, location, strict, expected): (&str, &[usize], bool, &str) = $value;
                assert_eq!(NumberingFormat::parse(format).format(location, strict), expected);
            }
            }
        )*
        }
    }

    format_tests! {
        ones: ("1.1.a-A", &[1, 1, 1, 1], false, "1.1.a-A"),
        twos: ("1.1.a-A", &[2, 2, 2, 2], false, "2.2.b-B"),
        too_deep_strict: ("1.1.a-A", &[1, 2, 3, 4, 5, 6], true, ""),
        too_deep_lenient: ("1.1.a-A", &[1, 2, 3, 4, 5, 6], false, "1.2.c-D"),
        shallow: ("1.1.a-A", &[3, 1], true, "3.1"),
        roman: ("I.i", &[4, 9], false, "IV.ix"),
        trailing_fixed: ("1.", &[7], false, "7."),
        empty_location: ("1.1", &[], false, ""),
    }

    #[test]
    fn alphabetic_counters() {
        assert_eq!(Counter::Alphabetic { uppercase: false }.format(2), "b");
        assert_eq!(Counter::Alphabetic { uppercase: true }.format(3), "C");
        assert_eq!(Counter::Alphabetic { uppercase: false }.format(0), "0");
        assert_eq!(Counter::Alphabetic { uppercase: false }.format(27), "27");
    }

    #[test]
    fn roman_counters() {
        assert_eq!(Counter::Roman { uppercase: true }.format(1994), "MCMXCIV");
        assert_eq!(Counter::Roman { uppercase: true }.format(4000), "4000");
        assert_eq!(Counter::Roman { uppercase: true }.format(0), "0");
    }
}
