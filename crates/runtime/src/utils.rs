
pub mod parse {
    pub fn take_char(input: &str) -> (Option<char>, &str) {
        let mut chars = input.chars();
        let next = chars.next();
        (next, chars.as_str())
    }
    pub fn take_while(input: &str, f: impl Fn(char) -> bool) -> (&str, &str) {
        for (i, c) in input.char_indices() {
            if !f(c) { return input.split_at(i); }
        }
        (input, "")
    }
}


// Adapted from anyhow's debug formatter
struct Indented<'a, T> {
    inner: &'a mut T,
    indent: usize,
    prefix: Option<&'a str>,
}
impl<'a, T> std::fmt::Write for Indented<'a, T> where T: std::fmt::Write {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        for (i, line) in s.split('\n').enumerate() {
            if let Some(prefix) = self.prefix.take() {
                write!(self.inner, "{:>width$}", prefix, width=self.indent)?;
            } else if i > 0 {
                self.inner.write_char('\n')?;
                write!(self.inner, "{:>width$}", "", width=self.indent)?;
            }
            self.inner.write_str(line)?;
        }
        Ok(())
    }
}

/// Write an error followed by its numbered `source()` chain.
pub fn format_error<E, W>(f: &mut W, error: &E) -> Result<(), std::fmt::Error> where W: std::fmt::Write, E: std::error::Error + ?Sized {
    use std::fmt::Write;
    write!(f, "{}", error)?;

    let mut next_cause = error.source();
    if next_cause.is_some() {
        write!(f, "\n\nCaused by:")?;
    }
    let mut n = 0;
    while let Some(cause) = next_cause {
        writeln!(f)?;
        let prefix = format!("{}: ", n);
        let mut indented = Indented { inner: &mut *f, indent: 7, prefix: Some(&prefix) };
        write!(indented, "{}", cause)?;
        next_cause = cause.source();
        n += 1;
    }
    Ok(())
}

pub fn format_error_disp<'a, E>(e: &'a E) -> impl std::fmt::Display + 'a where E: std::error::Error + ?Sized {
    struct Disp<'a, E: ?Sized>(&'a E);
    impl<E> std::fmt::Display for Disp<'_, E> where E: std::error::Error + ?Sized {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            format_error(f, self.0)
        }
    }
    Disp(e)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] Inner);

    #[derive(Debug, thiserror::Error)]
    #[error("inner\nsecond line")]
    struct Inner;

    #[test]
    fn error_chain_is_numbered() {
        let text = format_error_disp(&Outer(Inner)).to_string();
        assert_eq!(text, "outer\n\nCaused by:\n    0: inner\n       second line");
    }

    #[test]
    fn single_error_has_no_chain() {
        assert_eq!(format_error_disp(&Inner).to_string(), "inner\nsecond line");
    }

    #[test]
    fn take_helpers() {
        assert_eq!(parse::take_while("abc=1", |c| c.is_alphabetic()), ("abc", "=1"));
        assert_eq!(parse::take_char("=1"), (Some('='), "1"));
        assert_eq!(parse::take_char(""), (None, ""));
    }
}
