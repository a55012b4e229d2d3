//! Per-flag bit vectors over [`FLAGS`]. Optimization levels are mutually
//! exclusive bits; no level bit means `-O0`.

use super::{Configuration, Error, OptLevel, Toggle, Toggles};

pub const FLAGS: [&str; 6] = [
    "-O1",
    "-O2",
    "-O3",
    "-Os",
    "-fomit-frame-pointer",
    "-funroll-loops",
];

const LEVELS: [OptLevel; 4] = [OptLevel::O1, OptLevel::O2, OptLevel::O3, OptLevel::Os];

pub fn encode(configuration: &Configuration) -> Vec<bool> {
    let mut bits = Vec::with_capacity(FLAGS.len());
    bits.extend(LEVELS.iter().map(|level| *level == configuration.level()));
    bits.extend(
        Toggle::ALL
            .iter()
            .map(|toggle| configuration.toggles().contains(*toggle)),
    );
    bits
}

pub fn decode(bits: &[bool]) -> Result<Configuration, Error> {
    if bits.len() != FLAGS.len() {
        return Err(Error::BitLength {
            expected: FLAGS.len(),
            found: bits.len(),
        });
    }

    let (levels, toggles) = bits.split_at(LEVELS.len());
    let mut level = None;
    for (index, _) in levels.iter().enumerate().filter(|(_, bit)| **bit) {
        if level.replace(LEVELS[index]).is_some() {
            return Err(Error::ConflictingLevels);
        }
    }

    let mut set = Toggles::default();
    for (index, _) in toggles.iter().enumerate().filter(|(_, bit)| **bit) {
        set.insert(Toggle::ALL[index]);
    }

    Ok(Configuration::new(level.unwrap_or(OptLevel::O0), set))
}

/// Parses a string of `0`/`1` characters, one per entry in [`FLAGS`].
pub fn parse(bits: &str) -> Result<Configuration, Error> {
    let bits = bits
        .chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            _ => Err(Error::InvalidBit(c)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    decode(&bits)
}

pub fn format(configuration: &Configuration) -> String {
    encode(configuration)
        .into_iter()
        .map(|bit| if bit { '1' } else { '0' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_vector_is_level_zero() {
        assert_eq!(
            parse("000000").unwrap(),
            Configuration::pure(OptLevel::O0)
        );
    }

    #[test]
    fn decodes_level_and_toggles() {
        let configuration = parse("001001").unwrap();
        assert_eq!(configuration.level(), OptLevel::O3);
        assert_eq!(
            configuration.compiler_arguments(),
            vec!["-O3", "-funroll-loops"]
        );
        assert_eq!(format(&configuration), "001001");
    }

    #[test]
    fn every_configuration_round_trips() {
        for configuration in Configuration::all() {
            assert_eq!(decode(&encode(&configuration)).unwrap(), configuration);
        }
    }

    #[test]
    fn rejects_invalid_vectors() {
        assert_eq!(parse("110000"), Err(Error::ConflictingLevels));
        assert_eq!(
            parse("0000"),
            Err(Error::BitLength {
                expected: 6,
                found: 4
            })
        );
        assert_eq!(parse("00000x"), Err(Error::InvalidBit('x')));
    }
}
