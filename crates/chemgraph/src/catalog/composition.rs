use nom::{
    IResult,
    character::complete::{char, satisfy, u32},
    combinator::{all_consuming, cut, map, not, opt, recognize},
    multi::many1,
    sequence::{pair, preceded},
};

/// Parses a functional group composition like `C7H7SO2` into element counts, merging repeated symbols while
/// keeping the order in which they first appear
pub(super) fn parse(formula: &str) -> Option<Vec<(String, u32)>> {
    let (_, components) = composition(formula).ok()?;

    let mut merged: Vec<(String, u32)> = Vec::with_capacity(components.len());
    for (symbol, count) in components {
        if let Some((_, total)) = merged.iter_mut().find(|(s, _)| s == symbol) {
            *total += count;
        } else {
            merged.push((symbol.to_owned(), count));
        }
    }
    Some(merged)
}

/// Composition = { Symbol , [ Count ] }- ;
fn composition(i: &str) -> IResult<&str, Vec<(&str, u32)>> {
    let component = pair(symbol, map(opt(count), |c| c.unwrap_or(1)));
    all_consuming(many1(component))(i)
}

/// Symbol = uppercase , [ lowercase ] ;
fn symbol(i: &str) -> IResult<&str, &str> {
    let uppercase = satisfy(|c| c.is_ascii_uppercase());
    let lowercase = satisfy(|c| c.is_ascii_lowercase());
    recognize(pair(uppercase, opt(lowercase)))(i)
}

/// Count = digit - "0" , { digit } ;
fn count(i: &str) -> IResult<&str, u32> {
    preceded(cut(not(char('0'))), u32)(i)
}
