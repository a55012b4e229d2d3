//! Symbolic codes: one level character followed by the toggle characters,
//! e.g. `3`, `2u`, `sfu`.

use super::{Configuration, Error, OptLevel, Toggle, Toggles};

pub fn encode(configuration: &Configuration) -> String {
    let mut code = String::with_capacity(1 + configuration.toggles().len());
    code.push(configuration.level().code());
    code.extend(configuration.toggles().iter().map(Toggle::code));
    code
}

pub fn decode(code: &str) -> Result<Configuration, Error> {
    let mut chars = code.chars();
    let level = OptLevel::from_code(chars.next().ok_or(Error::Empty)?)?;
    let mut toggles = Toggles::default();
    for c in chars {
        if !toggles.insert(Toggle::from_code(c)?) {
            return Err(Error::DuplicateToggle(c));
        }
    }
    Ok(Configuration::new(level, toggles))
}
