use std::fmt;

/// A datum in the Emacs Lisp reader syntax subset spoken over EPC.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `nil`, which is also the empty list.
    Nil,
    Integer(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    /// A proper, non-empty list.
    List(Vec<Value>),
    /// `(a b . c)`: at least one leading element and a final cdr that is
    /// not itself a list. Build through [`Value::dotted`].
    DottedList(Vec<Value>, Box<Value>),
    Vector(Vec<Value>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    /// Builds a list, collapsing the empty list to `nil`.
    pub fn list(items: Vec<Value>) -> Self {
        if items.is_empty() {
            Value::Nil
        } else {
            Value::List(items)
        }
    }

    /// Conses `items` onto `tail`, folding list tails into the items.
    pub fn dotted(mut items: Vec<Value>, tail: Value) -> Self {
        match tail {
            Value::Nil => Value::list(items),
            Value::List(rest) => {
                items.extend(rest);
                Value::List(items)
            }
            Value::DottedList(rest, tail) => {
                items.extend(rest);
                Value::DottedList(items, tail)
            }
            other if items.is_empty() => other,
            other => Value::DottedList(items, Box::new(other)),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// The elements of a proper list; `nil` is the empty list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::Nil => Some(&[]),
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::List(_) | Value::DottedList(..) => "cons",
            Value::Vector(_) => "vector",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        if b {
            Value::symbol("t")
        } else {
            Value::Nil
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write_float(f, *n),
            Value::Str(s) => write_string(f, s),
            Value::Symbol(s) => write_symbol(f, s),
            Value::List(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                f.write_str(")")
            }
            Value::DottedList(items, tail) => {
                let canonical = !items.is_empty()
                    && !matches!(**tail, Value::Nil | Value::List(_) | Value::DottedList(..));
                if !canonical {
                    return write!(f, "{}", Value::dotted(items.clone(), (**tail).clone()));
                }
                f.write_str("(")?;
                write_items(f, items)?;
                write!(f, " . {tail})")
            }
            Value::Vector(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_float(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        f.write_str("0.0e+NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "1.0e+INF" } else { "-1.0e+INF" })
    } else {
        // Debug keeps a decimal point or exponent, so Emacs reads a float back.
        write!(f, "{n:?}")
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            _ => write!(f, "{ch}")?,
        }
    }
    f.write_str("\"")
}

fn write_symbol(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    if s.is_empty() {
        return f.write_str("##");
    }
    // A symbol spelled like a number must be escaped to stay a symbol.
    if s.parse::<f64>().is_ok() {
        f.write_str("\\")?;
    }
    for ch in s.chars() {
        if needs_symbol_escape(ch) {
            f.write_str("\\")?;
        }
        write!(f, "{ch}")?;
    }
    Ok(())
}

fn needs_symbol_escape(ch: char) -> bool {
    ch.is_whitespace()
        || matches!(
            ch,
            '(' | ')' | '[' | ']' | '"' | '\'' | ';' | '#' | '`' | ',' | '\\' | '?' | '.'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_atoms() {
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Integer(-42).to_string(), "-42");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(f64::INFINITY).to_string(), "1.0e+INF");
        assert_eq!(Value::symbol("return").to_string(), "return");
        assert_eq!(Value::from(true).to_string(), "t");
        assert_eq!(Value::from(false).to_string(), "nil");
    }

    #[test]
    fn test_display_escapes_strings() {
        let value = Value::string(r#"say "hi" \o/"#);
        assert_eq!(value.to_string(), r#""say \"hi\" \\o/""#);
        // Newlines are legal inside Emacs strings and are printed raw.
        assert_eq!(Value::string("a\nb").to_string(), "\"a\nb\"");
    }

    #[test]
    fn test_display_escapes_symbols() {
        assert_eq!(Value::symbol("a b").to_string(), "a\\ b");
        assert_eq!(Value::symbol("12").to_string(), "\\12");
        assert_eq!(Value::symbol("").to_string(), "##");
    }

    #[test]
    fn test_display_containers() {
        let value = Value::list(vec![
            Value::symbol("return"),
            Value::Integer(1),
            Value::string("ciaopolpetteeee"),
        ]);
        assert_eq!(value.to_string(), r#"(return 1 "ciaopolpetteeee")"#);

        let pair = Value::DottedList(vec![Value::Integer(1)], Box::new(Value::Integer(2)));
        assert_eq!(pair.to_string(), "(1 . 2)");

        let vector = Value::Vector(vec![Value::Integer(1), Value::Nil]);
        assert_eq!(vector.to_string(), "[1 nil]");
    }

    #[test]
    fn test_dotted_normalises_tail() {
        let a = Value::symbol("a");
        let b = Value::symbol("b");
        assert_eq!(Value::dotted(vec![], Value::Integer(1)), Value::Integer(1));
        assert_eq!(Value::dotted(vec![a.clone()], Value::Nil), Value::List(vec![a.clone()]));
        assert_eq!(
            Value::dotted(vec![a.clone()], Value::List(vec![b.clone()])),
            Value::List(vec![a.clone(), b.clone()])
        );
        assert_eq!(
            Value::dotted(
                vec![a.clone()],
                Value::DottedList(vec![b.clone()], Box::new(Value::Integer(3)))
            ),
            Value::DottedList(vec![a, b], Box::new(Value::Integer(3)))
        );
    }

    #[test]
    fn test_display_hand_built_dotted_lists() {
        let headless = Value::DottedList(vec![], Box::new(Value::Integer(1)));
        assert_eq!(headless.to_string(), "1");

        let list_tail = Value::DottedList(
            vec![Value::symbol("a")],
            Box::new(Value::List(vec![Value::symbol("b")])),
        );
        assert_eq!(list_tail.to_string(), "(a b)");

        let nil_tail = Value::DottedList(vec![Value::Integer(1)], Box::new(Value::Nil));
        assert_eq!(nil_tail.to_string(), "(1)");
    }

    #[test]
    fn test_empty_list_is_nil() {
        assert_eq!(Value::list(vec![]), Value::Nil);
        assert_eq!(Value::Nil.as_list(), Some(&[][..]));
    }
}
