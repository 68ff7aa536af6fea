use crate::relay::InvalidRelay;

pub fn assert<E, S>(expr: E, err: S) -> Result<(), InvalidRelay>
where
    E: FnOnce() -> bool,
    S: Into<String>,
{
    match expr() {
        true => Ok(()),
        false => Err(InvalidRelay::new(err)),
    }
}
