//! Standard expressions.
//!
//! Expressions that need a value evaluate to nothing when an operand
//! evaluates to nothing.

use std::sync::Arc;

use quill_foundation::{Error, ErrorKind, Result, Value};
use quill_parser::{Arity, ExprRef, Expression, Registration, TriggerContext};

/// Registers the standard expressions.
///
/// Integer arithmetic has a lower priority than number arithmetic, so it
/// only wins where an integer is required.
///
/// # Errors
///
/// Returns an error if a standard type is not registered yet.
pub fn register(reg: &mut Registration) -> Result<()> {
    reg.register_expression(
        &["%number% (1:+|2:-|3:*|4:/) %number%"],
        "number",
        Arity::Either,
        |m, _| {
            let op = Operator::from_mark(m.numeric_mark())?;
            Ok(Arc::new(Arithmetic::new(op, m.require(0)?, m.require(1)?, "number")))
        },
    )?;
    reg.register_expression(
        &["%integer% (1:+|2:-|3:*) %integer%"],
        "integer",
        Arity::Either,
        |m, _| {
            let op = Operator::from_mark(m.numeric_mark())?;
            Ok(Arc::new(Arithmetic::new(op, m.require(0)?, m.require(1)?, "integer")))
        },
    )?
    .set_priority(-1);

    reg.register_expression(
        &["[the] (1:first|2:last) occurrence of %string% in %string%"],
        "integer",
        Arity::Either,
        |m, _| {
            Ok(Arc::new(Occurrence {
                last: m.numeric_mark() == 2,
                needle: m.require(0)?,
                haystack: m.require(1)?,
            }))
        },
    )?;
    reg.register_expression(&["[the] length of %string%"], "integer", Arity::Either, |m, _| {
        Ok(Arc::new(Length(m.require(0)?)))
    })?;
    reg.register_expression(
        &["%strings% joined (with|by) %string%"],
        "string",
        Arity::Either,
        |m, _| {
            Ok(Arc::new(Joined {
                items: m.require(0)?,
                delimiter: m.require(1)?,
            }))
        },
    )?;

    reg.register_expression(
        &["%number% is (1:greater|2:less) than %number%"],
        "boolean",
        Arity::Either,
        |m, _| {
            Ok(Arc::new(Compare {
                greater: m.numeric_mark() == 1,
                left: m.require(0)?,
                right: m.require(1)?,
            }))
        },
    )?;
    reg.register_expression(
        &["%objects% (is|are) [1:not] %objects%"],
        "boolean",
        Arity::Either,
        |m, _| {
            Ok(Arc::new(Equals {
                negated: m.numeric_mark() == 1,
                left: m.require(0)?,
                right: m.require(1)?,
            }))
        },
    )?
    .set_priority(-1);
    reg.register_expression(&["not %boolean%"], "boolean", Arity::Either, |m, _| {
        Ok(Arc::new(Not(m.require(0)?)))
    })?;
    Ok(())
}

// =============================================================================
// Arithmetic
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    fn from_mark(mark: i64) -> Result<Self> {
        match mark {
            1 => Ok(Self::Add),
            2 => Ok(Self::Subtract),
            3 => Ok(Self::Multiply),
            4 => Ok(Self::Divide),
            _ => Err(Error::new(ErrorKind::Internal(format!(
                "no operator for mark {mark}"
            )))),
        }
    }

    const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }

    fn apply_float(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
            Self::Divide => a / b,
        }
    }

    fn apply_int(self, a: i64, b: i64) -> Result<i64> {
        let result = match self {
            Self::Add => a.checked_add(b),
            Self::Subtract => a.checked_sub(b),
            Self::Multiply => a.checked_mul(b),
            Self::Divide => a.checked_div(b),
        };
        result.ok_or_else(|| Error::runtime(format!("integer overflow in {a} {} {b}", self.symbol())))
    }
}

/// `a + b` over numbers or integers, depending on the return type.
struct Arithmetic {
    op: Operator,
    left: ExprRef,
    right: ExprRef,
    return_type: &'static str,
}

impl Arithmetic {
    fn new(op: Operator, left: ExprRef, right: ExprRef, return_type: &'static str) -> Self {
        Self {
            op,
            left,
            right,
            return_type,
        }
    }
}

impl Expression for Arithmetic {
    fn return_type(&self) -> &str {
        self.return_type
    }

    fn values(&self, ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
        let (Some(a), Some(b)) = (self.left.single(ctx)?, self.right.single(ctx)?) else {
            return Ok(Vec::new());
        };
        let value = match (a, b) {
            (Value::Int(a), Value::Int(b)) if self.return_type == "integer" => {
                Value::Int(self.op.apply_int(a, b)?)
            }
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(a), Some(b)) => Value::Float(self.op.apply_float(a, b)),
                _ => return Err(Error::runtime(format!("can't compute {}", self.describe()))),
            },
        };
        Ok(vec![value])
    }

    fn describe(&self) -> String {
        format!(
            "{} {} {}",
            self.left.describe(),
            self.op.symbol(),
            self.right.describe()
        )
    }
}

// =============================================================================
// Text
// =============================================================================

fn text(expr: &ExprRef, ctx: &dyn TriggerContext) -> Result<Option<String>> {
    Ok(expr.single(ctx)?.map(|v| match v.as_str() {
        Some(s) => s.to_string(),
        None => v.to_string(),
    }))
}

/// 1-based character index of a substring, counted from the left.
struct Occurrence {
    last: bool,
    needle: ExprRef,
    haystack: ExprRef,
}

impl Expression for Occurrence {
    fn return_type(&self) -> &str {
        "integer"
    }

    fn values(&self, ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
        let (Some(needle), Some(haystack)) = (text(&self.needle, ctx)?, text(&self.haystack, ctx)?)
        else {
            return Ok(Vec::new());
        };
        let found = if self.last {
            haystack.rfind(&needle)
        } else {
            haystack.find(&needle)
        };
        let Some(byte) = found else {
            return Ok(Vec::new());
        };
        let index = haystack[..byte].chars().count() + 1;
        let index = i64::try_from(index).map_err(|_| Error::runtime("index out of range"))?;
        Ok(vec![Value::Int(index)])
    }

    fn describe(&self) -> String {
        format!(
            "the {} occurrence of {} in {}",
            if self.last { "last" } else { "first" },
            self.needle.describe(),
            self.haystack.describe()
        )
    }
}

struct Length(ExprRef);

impl Expression for Length {
    fn return_type(&self) -> &str {
        "integer"
    }

    fn values(&self, ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
        let Some(s) = text(&self.0, ctx)? else {
            return Ok(Vec::new());
        };
        let length = i64::try_from(s.chars().count()).map_err(|_| Error::runtime("string too long"))?;
        Ok(vec![Value::Int(length)])
    }

    fn describe(&self) -> String {
        format!("the length of {}", self.0.describe())
    }
}

struct Joined {
    items: ExprRef,
    delimiter: ExprRef,
}

impl Expression for Joined {
    fn return_type(&self) -> &str {
        "string"
    }

    fn values(&self, ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
        let delimiter = text(&self.delimiter, ctx)?.unwrap_or_default();
        let items: Vec<String> = self
            .items
            .values(ctx)?
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .collect();
        Ok(vec![Value::from(items.join(&delimiter))])
    }

    fn describe(&self) -> String {
        format!(
            "{} joined with {}",
            self.items.describe(),
            self.delimiter.describe()
        )
    }
}

// =============================================================================
// Comparisons
// =============================================================================

/// Numeric values compare by value regardless of int/float backing.
#[allow(clippy::float_cmp)]
fn same(a: &Value, b: &Value) -> bool {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

struct Compare {
    greater: bool,
    left: ExprRef,
    right: ExprRef,
}

impl Expression for Compare {
    fn return_type(&self) -> &str {
        "boolean"
    }

    fn values(&self, ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
        let a = self.left.single(ctx)?.and_then(|v| v.as_number());
        let b = self.right.single(ctx)?.and_then(|v| v.as_number());
        let result = match (a, b) {
            (Some(a), Some(b)) if self.greater => a > b,
            (Some(a), Some(b)) => a < b,
            _ => false,
        };
        Ok(vec![Value::Bool(result)])
    }

    fn describe(&self) -> String {
        format!(
            "{} is {} than {}",
            self.left.describe(),
            if self.greater { "greater" } else { "less" },
            self.right.describe()
        )
    }
}

/// True when every left value equals one of the right values.
struct Equals {
    negated: bool,
    left: ExprRef,
    right: ExprRef,
}

impl Expression for Equals {
    fn return_type(&self) -> &str {
        "boolean"
    }

    fn values(&self, ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
        let left = self.left.values(ctx)?;
        let right = self.right.values(ctx)?;
        let equal = !left.is_empty()
            && !right.is_empty()
            && left.iter().all(|a| right.iter().any(|b| same(a, b)));
        Ok(vec![Value::Bool(equal != self.negated)])
    }

    fn describe(&self) -> String {
        format!(
            "{} is {}{}",
            self.left.describe(),
            if self.negated { "not " } else { "" },
            self.right.describe()
        )
    }
}

struct Not(ExprRef);

impl Expression for Not {
    fn return_type(&self) -> &str {
        "boolean"
    }

    fn values(&self, ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
        Ok(self
            .0
            .single(ctx)?
            .and_then(|v| v.as_bool())
            .map(|b| vec![Value::Bool(!b)])
            .unwrap_or_default())
    }

    fn describe(&self) -> String {
        format!("not {}", self.0.describe())
    }
}
