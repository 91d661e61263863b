//! Reader for the Emacs Lisp S-expression subset carried in EPC payloads.
//!
//! Printing lives on [`Value`]'s `Display` impl. The reader accepts what
//! `prin1` produces for strings, numbers, symbols, lists, dotted pairs and
//! vectors, plus `'x` shorthand and `;` comments.

use crate::domain::model::Value;
use crate::utils::error::{Result, ServerError};

/// Deepest nesting of lists, vectors and quotes the reader accepts.
pub const MAX_DEPTH: usize = 256;

/// Parses exactly one datum; only whitespace and comments may follow it.
pub fn parse(text: &str) -> Result<Value> {
    let mut reader = Reader::new(text);
    let value = reader.read_datum()?;
    reader.skip_atmosphere();
    if let Some(ch) = reader.peek() {
        return Err(reader.error(format!("trailing input starting with {ch:?}")));
    }
    Ok(value)
}

struct Reader {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Reader {
    fn new(text: &str) -> Self {
        Reader {
            chars: text.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn error(&self, message: impl Into<String>) -> ServerError {
        ServerError::ParseError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn skip_atmosphere(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.pos += 1;
            } else if ch == ';' {
                while let Some(ch) = self.bump() {
                    if ch == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn read_datum(&mut self) -> Result<Value> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("nesting deeper than {MAX_DEPTH} levels")));
        }
        self.depth += 1;
        let result = self.read_form();
        self.depth -= 1;
        result
    }

    fn read_form(&mut self) -> Result<Value> {
        self.skip_atmosphere();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('(') => {
                self.pos += 1;
                self.read_list()
            }
            Some('[') => {
                self.pos += 1;
                self.read_vector()
            }
            Some(ch @ (')' | ']')) => Err(self.error(format!("unexpected {ch:?}"))),
            Some('"') => {
                self.pos += 1;
                self.read_string().map(Value::Str)
            }
            Some('\'') => {
                self.pos += 1;
                let quoted = self.read_datum()?;
                Ok(Value::List(vec![Value::symbol("quote"), quoted]))
            }
            Some('#') => {
                if self.peek_at(1) == Some('#') {
                    self.pos += 2;
                    Ok(Value::symbol(""))
                } else {
                    Err(self.error("unsupported '#' reader syntax"))
                }
            }
            Some(ch @ ('`' | ',')) => Err(self.error(format!("unsupported reader syntax {ch:?}"))),
            Some(_) => self.read_atom(),
        }
    }

    fn at_dot(&self) -> bool {
        self.peek() == Some('.') && self.peek_at(1).is_none_or(is_delimiter)
    }

    fn read_list(&mut self) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            self.skip_atmosphere();
            match self.peek() {
                None => return Err(self.error("unterminated list")),
                Some(')') => {
                    self.pos += 1;
                    return Ok(Value::list(items));
                }
                Some(_) if self.at_dot() => {
                    if items.is_empty() {
                        return Err(self.error("'.' with nothing before it"));
                    }
                    self.pos += 1;
                    let tail = self.read_datum()?;
                    self.skip_atmosphere();
                    if self.bump() != Some(')') {
                        return Err(self.error("expected ')' after dotted tail"));
                    }
                    return Ok(Value::dotted(items, tail));
                }
                Some(_) => items.push(self.read_datum()?),
            }
        }
    }

    fn read_vector(&mut self) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            self.skip_atmosphere();
            match self.peek() {
                None => return Err(self.error("unterminated vector")),
                Some(']') => {
                    self.pos += 1;
                    return Ok(Value::Vector(items));
                }
                Some(_) => items.push(self.read_datum()?),
            }
        }
    }

    fn read_string(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => {
                    if let Some(ch) = self.read_string_escape()? {
                        out.push(ch);
                    }
                }
                Some(ch) => out.push(ch),
            }
        }
    }

    /// Returns `None` for escapes that produce no character.
    fn read_string_escape(&mut self) -> Result<Option<char>> {
        let Some(ch) = self.bump() else {
            return Err(self.error("unterminated escape"));
        };
        let decoded = match ch {
            '\n' | ' ' => return Ok(None),
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'e' => '\u{1b}',
            'a' => '\u{7}',
            'f' => '\u{c}',
            'b' => '\u{8}',
            'v' => '\u{b}',
            'd' => '\u{7f}',
            's' => ' ',
            'x' => {
                let digits = self.take_while_max(usize::MAX, |c| c.is_ascii_hexdigit());
                self.char_from_digits(&digits, 16)?
            }
            'u' => {
                let digits = self.take_while_max(4, |c| c.is_ascii_hexdigit());
                if digits.len() != 4 {
                    return Err(self.error("\\u needs four hex digits"));
                }
                self.char_from_digits(&digits, 16)?
            }
            'U' => {
                let digits = self.take_while_max(8, |c| c.is_ascii_hexdigit());
                if digits.len() != 8 {
                    return Err(self.error("\\U needs eight hex digits"));
                }
                self.char_from_digits(&digits, 16)?
            }
            '0'..='7' => {
                let mut digits = ch.to_string();
                digits.push_str(&self.take_while_max(2, |c| ('0'..='7').contains(&c)));
                self.char_from_digits(&digits, 8)?
            }
            other => other,
        };
        Ok(Some(decoded))
    }

    fn take_while_max(&mut self, max: usize, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while out.len() < max {
            match self.peek() {
                Some(c) if pred(c) => {
                    out.push(c);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        out
    }

    fn char_from_digits(&self, digits: &str, radix: u32) -> Result<char> {
        u32::from_str_radix(digits, radix)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(format!("invalid character code {digits:?}")))
    }

    fn read_atom(&mut self) -> Result<Value> {
        let mut token = String::new();
        let mut escaped = false;
        while let Some(ch) = self.peek() {
            if is_delimiter(ch) {
                break;
            }
            self.pos += 1;
            if ch == '\\' {
                let Some(next) = self.bump() else {
                    return Err(self.error("unterminated escape in symbol"));
                };
                escaped = true;
                token.push(next);
            } else {
                token.push(ch);
            }
        }

        if escaped {
            return Ok(Value::Symbol(token));
        }
        if token == "nil" {
            return Ok(Value::Nil);
        }
        if let Some(number) = self.parse_number(&token)? {
            return Ok(number);
        }
        Ok(Value::Symbol(token))
    }

    fn parse_number(&self, token: &str) -> Result<Option<Value>> {
        let unsigned = token.strip_prefix(['+', '-']).unwrap_or(token);
        let integer_digits = unsigned.strip_suffix('.').unwrap_or(unsigned);
        if !integer_digits.is_empty() && integer_digits.bytes().all(|b| b.is_ascii_digit()) {
            let digits = token.strip_suffix('.').unwrap_or(token);
            return digits
                .parse::<i64>()
                .map(|n| Some(Value::Integer(n)))
                .map_err(|_| self.error(format!("integer out of range: {token}")));
        }

        let negative = token.starts_with('-');
        if let Some(mantissa) = unsigned.strip_suffix("e+INF") {
            if is_float_literal(mantissa) {
                let inf = if negative { f64::NEG_INFINITY } else { f64::INFINITY };
                return Ok(Some(Value::Float(inf)));
            }
        }
        if let Some(mantissa) = unsigned.strip_suffix("e+NaN") {
            if is_float_literal(mantissa) {
                return Ok(Some(Value::Float(f64::NAN)));
            }
        }

        if is_float_literal(unsigned) {
            if let Ok(n) = token.parse::<f64>() {
                return Ok(Some(Value::Float(n)));
            }
        }
        Ok(None)
    }
}

/// Digits with a fractional part and/or an exponent, sign already stripped.
fn is_float_literal(s: &str) -> bool {
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (mantissa, None),
    };
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) {
        return false;
    }
    let exponent_ok = match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['+', '-']).unwrap_or(e);
            !e.is_empty() && all_digits(e)
        }
    };
    match frac_part {
        Some(frac) if !frac.is_empty() => all_digits(frac) && exponent_ok,
        // "1.e3"; a bare "1." is an integer and never reaches here.
        Some(_) | None => !int_part.is_empty() && exponent.is_some() && exponent_ok,
    }
}

fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '[' | ']' | '"' | '\'' | ';')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call_message() {
        let value = parse(r#"(call 1 query ("ciao"))"#).unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::symbol("call"),
                Value::Integer(1),
                Value::symbol("query"),
                Value::List(vec![Value::string("ciao")]),
            ])
        );
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse("42").unwrap(), Value::Integer(42));
        assert_eq!(parse("-7").unwrap(), Value::Integer(-7));
        assert_eq!(parse("+3").unwrap(), Value::Integer(3));
        assert_eq!(parse("5.").unwrap(), Value::Integer(5));
        assert_eq!(parse("1.5").unwrap(), Value::Float(1.5));
        assert_eq!(parse(".5").unwrap(), Value::Float(0.5));
        assert_eq!(parse("1e3").unwrap(), Value::Float(1000.0));
        assert_eq!(parse("-2.5e-1").unwrap(), Value::Float(-0.25));
        assert_eq!(parse("1.0e+INF").unwrap(), Value::Float(f64::INFINITY));
        assert_eq!(parse("-1.0e+INF").unwrap(), Value::Float(f64::NEG_INFINITY));
        assert!(matches!(parse("0.0e+NaN").unwrap(), Value::Float(n) if n.is_nan()));
        assert!(parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_number_lookalikes_are_symbols() {
        assert_eq!(parse("1+").unwrap(), Value::symbol("1+"));
        assert_eq!(parse("-").unwrap(), Value::symbol("-"));
        assert_eq!(parse("inf").unwrap(), Value::symbol("inf"));
        assert_eq!(parse("e5").unwrap(), Value::symbol("e5"));
        assert_eq!(parse("\\12").unwrap(), Value::symbol("12"));
    }

    #[test]
    fn test_parse_string_escapes() {
        assert_eq!(parse(r#""a\"b\\c""#).unwrap(), Value::string("a\"b\\c"));
        assert_eq!(parse(r#""tab\there\n""#).unwrap(), Value::string("tab\there\n"));
        assert_eq!(parse(r#""\x41\ B""#).unwrap(), Value::string("AB"));
        assert_eq!(parse(r#""\x41;""#).unwrap(), Value::string("A;"));
        assert_eq!(parse(r#""è""#).unwrap(), Value::string("è"));
        assert_eq!(parse(r#""\101""#).unwrap(), Value::string("A"));
        assert_eq!(parse("\"line\\\ncontinued\"").unwrap(), Value::string("linecontinued"));
        assert_eq!(parse("\"raw\nnewline\"").unwrap(), Value::string("raw\nnewline"));
        assert_eq!(parse(r#""polpette 🍝""#).unwrap(), Value::string("polpette 🍝"));
    }

    #[test]
    fn test_parse_nil_forms() {
        assert_eq!(parse("nil").unwrap(), Value::Nil);
        assert_eq!(parse("()").unwrap(), Value::Nil);
        assert_eq!(parse("( ; empty\n )").unwrap(), Value::Nil);
        assert_eq!(parse("t").unwrap(), Value::symbol("t"));
    }

    #[test]
    fn test_parse_dotted_pairs() {
        assert_eq!(
            parse("(a . b)").unwrap(),
            Value::DottedList(vec![Value::symbol("a")], Box::new(Value::symbol("b")))
        );
        assert_eq!(
            parse("(1 . (2 3))").unwrap(),
            Value::List(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
        );
        assert_eq!(parse("(1 . nil)").unwrap(), Value::List(vec![Value::Integer(1)]));
        assert_eq!(
            parse("(1 .5)").unwrap(),
            Value::List(vec![Value::Integer(1), Value::Float(0.5)])
        );
        assert!(parse("(. a)").is_err());
        assert!(parse("(a . b c)").is_err());
    }

    #[test]
    fn test_parse_vectors_and_quote() {
        assert_eq!(
            parse("[1 \"x\" nil]").unwrap(),
            Value::Vector(vec![Value::Integer(1), Value::string("x"), Value::Nil])
        );
        assert_eq!(
            parse("'foo").unwrap(),
            Value::List(vec![Value::symbol("quote"), Value::symbol("foo")])
        );
        assert_eq!(parse("##").unwrap(), Value::symbol(""));
    }

    #[test]
    fn test_parse_errors_report_offset() {
        match parse("(call 1") {
            Err(ServerError::ParseError { offset, .. }) => assert_eq!(offset, 7),
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(parse("").is_err());
        assert!(parse(")").is_err());
        assert!(parse("\"open").is_err());
        assert!(parse("1 2").is_err());
        assert!(parse("#<buffer foo>").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = format!("{}{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(parse(&nested).is_ok());

        let too_deep = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        match parse(&too_deep) {
            Err(ServerError::ParseError { offset, .. }) => assert_eq!(offset, MAX_DEPTH),
            other => panic!("expected parse error, got {other:?}"),
        }

        assert!(parse(&"'".repeat(MAX_DEPTH + 1)).is_err());
    }

    #[test]
    fn test_printed_values_read_back() {
        let values = [
            Value::string("ciao \"mondo\" \\ \n"),
            Value::symbol("with space"),
            Value::symbol("3"),
            Value::Float(0.1),
            Value::Float(1e100),
            Value::Float(f64::NEG_INFINITY),
            Value::Integer(i64::MIN),
            Value::List(vec![
                Value::symbol("return"),
                Value::Integer(9),
                Value::Vector(vec![Value::Nil, Value::from(true)]),
            ]),
            Value::DottedList(
                vec![Value::symbol("a"), Value::Integer(1)],
                Box::new(Value::string("tail")),
            ),
        ];
        for value in values {
            assert_eq!(parse(&value.to_string()).unwrap(), value, "printed {value}");
        }
    }
}
