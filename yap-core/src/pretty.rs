#![forbid(unsafe_code)]

//! Human-readable rendering of values and core terms.
//!
//! Values print by opening closures on a rigid variable named after the
//! binder, so printing never shows environments. Core terms print with the
//! names of their binders.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use yap_ast::{Implicitness, Literal, Multiplicity};

use crate::eval::apply;
use crate::syntax::{Alternative, Binding, Index, Level, Meta, MetaId, Pattern, Statement, Term, TermRow, Variable, atoms};
use crate::value::{Binder, Value, ValueRow};

impl fmt::Display for MetaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl fmt::Display for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "^{}", self.0)
    }
}

impl<B: fmt::Display> fmt::Display for Variable<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Bound(b) => write!(f, "{b}"),
            Variable::Free(name) | Variable::Label(name) | Variable::Foreign(name) => f.write_str(name),
            Variable::Meta(meta) => write!(f, "{meta}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ValuePrinter::default().print(self))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&TermPrinter::new(Vec::new()).print(self))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Wildcard => f.write_str("_"),
            Pattern::Binder(name) => f.write_str(name),
            Pattern::Lit(lit) => write!(f, "{lit}"),
            Pattern::Var { name, .. } => f.write_str(name),
            Pattern::Struct(row) => write!(f, "struct {row}"),
            Pattern::Row(row) => write!(f, "{row}"),
            Pattern::Variant(row) => {
                for (i, (label, p)) in row.fields().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "#{label} {p}")?;
                }
                Ok(())
            }
            Pattern::List { elements, rest } => {
                f.write_str("[")?;
                for (i, p) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{p}")?;
                }
                if let Some(rest) = rest {
                    write!(f, " | {rest}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Renders `value` naming rigid levels after `names` (outermost first).
pub fn display_value(value: &Value, names: &[String]) -> String {
    let names = names.iter().enumerate().map(|(i, n)| (Level(i), n.clone())).collect();
    ValuePrinter { names }.print(value)
}

/// Renders a core term under binders called `names` (outermost first).
pub fn display_term(term: &Term, names: &[String]) -> String {
    TermPrinter::new(names.to_vec()).print(term)
}

fn is_atomic_value(value: &Value) -> bool {
    match value.strip() {
        Value::Lit(_) | Value::Var(_) | Value::Row(_) => true,
        Value::App { func, .. } => {
            func.is_atom(atoms::SCHEMA) || func.is_atom(atoms::STRUCT) || func.is_atom(atoms::LIST)
        }
        _ => false,
    }
}

fn quantity_prefix(q: Multiplicity) -> String {
    match q {
        Multiplicity::Many => String::new(),
        q => format!("{q} "),
    }
}

#[derive(Default)]
struct ValuePrinter {
    names: BTreeMap<Level, String>,
}

impl ValuePrinter {
    fn print(&mut self, value: &Value) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write(&mut out, value);
        out
    }

    fn atom(&mut self, value: &Value) -> String {
        let printed = self.print(value);
        if is_atomic_value(value) { printed } else { format!("({printed})") }
    }

    fn level(&self, level: Level) -> String {
        match self.names.get(&level) {
            Some(name) => name.clone(),
            None => level.to_string(),
        }
    }

    fn write(&mut self, out: &mut String, value: &Value) -> fmt::Result {
        match value {
            Value::Lit(lit) => write!(out, "{lit}"),
            Value::Var(Variable::Bound(level)) => out.write_str(&self.level(*level)),
            Value::Var(var) => write!(out, "{var}"),
            Value::Neutral(inner) => self.write(out, inner),
            Value::Row(row) => {
                let row = self.row(row);
                out.write_str(&row)
            }
            Value::App { .. } => self.application(out, value),
            Value::Abs { binder, closure } => {
                let level = Level(closure.env.len());
                let name = binder.variable().to_string();
                let shadowed = self.names.insert(level, name.clone());
                let body = match apply(binder, closure, Value::rigid(level)) {
                    Ok(body) => self.print(&body),
                    Err(_) => TermPrinter::new(vec![name.clone()]).print(&closure.term),
                };
                match shadowed {
                    Some(old) => self.names.insert(level, old),
                    None => self.names.remove(&level),
                };
                match binder {
                    Binder::Lambda {
                        icit: Implicitness::Explicit,
                        ..
                    } => write!(out, "\\{name} -> {body}"),
                    Binder::Lambda { .. } => write!(out, "\\{{{name}}} => {body}"),
                    Binder::Pi {
                        icit,
                        multiplicity,
                        annotation,
                        ..
                    } => {
                        let q = quantity_prefix(*multiplicity);
                        match icit {
                            Implicitness::Implicit => {
                                write!(out, "{{{q}{name}: {}}} => {body}", self.print(annotation))
                            }
                            Implicitness::Explicit if name == "_" && q.is_empty() => {
                                write!(out, "{} -> {body}", self.atom(annotation))
                            }
                            Implicitness::Explicit => write!(out, "({q}{name}: {}) -> {body}", self.print(annotation)),
                        }
                    }
                    Binder::Mu { annotation, .. } => {
                        write!(out, "mu {name}: {}. {body}", self.atom(annotation))
                    }
                }
            }
            Value::Modal { value, modalities } => {
                write!(out, "<{}> {}", modalities.quantity, self.atom(value))?;
                if let Some(liquid) = &modalities.liquid {
                    write!(out, " [| {} |]", self.print(liquid))?;
                }
                Ok(())
            }
            Value::External { name, args, .. } => {
                out.write_str(name)?;
                for arg in args {
                    write!(out, " {}", self.atom(arg))?;
                }
                Ok(())
            }
            Value::Match(stuck) => {
                write!(out, "match {}", self.print(&stuck.scrutinee))?;
                let outer: Vec<String> = (0..stuck.env.len()).map(|l| self.level(Level(l))).collect();
                for alt in stuck.alternatives.iter() {
                    let mut names = outer.clone();
                    names.extend(alt.binders.iter().cloned());
                    write!(out, " | {} -> {}", alt.pattern, TermPrinter::new(names).print(&alt.body))?;
                }
                Ok(())
            }
            Value::Project { value, label } => write!(out, "{}.{label}", self.atom(value)),
            Value::Inject { value, label, field } => {
                write!(out, "{{ {} | {label} = {} }}", self.print(value), self.print(field))
            }
        }
    }

    fn application(&mut self, out: &mut String, value: &Value) -> fmt::Result {
        if let Some(row) = value.tagged_row(atoms::SCHEMA) {
            return write!(out, "{{ {} }}", self.fields(row, ": "));
        }
        if let Some(row) = value.tagged_row(atoms::STRUCT) {
            return write!(out, "struct {{ {} }}", self.fields(row, " = "));
        }
        if let Some(row) = value.tagged_row(atoms::VARIANT) {
            let arms: Vec<String> = row
                .fields()
                .map(|(label, ty)| format!("#{label} {}", self.atom(ty)))
                .collect();
            let mut printed = arms.join(" | ");
            if let Some(tail) = row.tail() {
                printed.push_str(&format!(" | {}", self.tail(tail)));
            }
            return write!(out, "<{printed}>");
        }
        if let Some(row) = value.tagged_row(atoms::LIST) {
            let items: Vec<String> = row.fields().map(|(_, v)| self.print(v)).collect();
            return write!(out, "[{}]", items.join(", "));
        }
        if let Value::App { icit, func, arg } = value {
            write!(out, "{} ", self.print(func))?;
            return match icit {
                Implicitness::Explicit => out.write_str(&self.atom(arg)),
                Implicitness::Implicit => write!(out, "@{}", self.atom(arg)),
            };
        }
        self.write(out, value)
    }

    fn tail(&self, tail: &Variable<Level>) -> String {
        match tail {
            Variable::Bound(level) => self.level(*level),
            other => other.to_string(),
        }
    }

    fn fields(&mut self, row: &ValueRow, separator: &str) -> String {
        let parts: Vec<String> = row
            .fields()
            .map(|(label, v)| format!("{label}{separator}{}", self.print(v)))
            .collect();
        let mut printed = parts.join(", ");
        if let Some(tail) = row.tail() {
            printed.push_str(&format!(" | {}", self.tail(tail)));
        }
        printed
    }

    fn row(&mut self, row: &ValueRow) -> String {
        format!("[{}]", self.fields(row, ": "))
    }
}

/// Core term printer. `names` holds one entry per enclosing binder, outermost
/// first; indices resolve against it from the end.
struct TermPrinter {
    names: Vec<String>,
}

impl TermPrinter {
    fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    fn index(&self, index: Index) -> String {
        match self.names.len().checked_sub(index.0 + 1) {
            Some(i) => self.names[i].clone(),
            None => index.to_string(),
        }
    }

    fn var(&self, var: &Variable<Index>) -> String {
        match var {
            Variable::Bound(index) => self.index(*index),
            other => other.to_string(),
        }
    }

    fn under<T>(&mut self, binders: impl IntoIterator<Item = String>, f: impl FnOnce(&mut Self) -> T) -> T {
        let before = self.names.len();
        self.names.extend(binders);
        let result = f(self);
        self.names.truncate(before);
        result
    }

    fn atom(&mut self, term: &Term) -> String {
        let printed = self.print(term);
        match term {
            Term::Lit(_) | Term::Var(_) | Term::Row(_) | Term::Proj { .. } => printed,
            _ => format!("({printed})"),
        }
    }

    fn print(&mut self, term: &Term) -> String {
        match term {
            Term::Lit(lit) => lit.to_string(),
            Term::Var(var) => self.var(var),
            Term::App { func, arg, icit } => {
                if let Term::Lit(Literal::Atom(tag)) = func.as_ref() {
                    if let Term::Row(row) = arg.as_ref() {
                        match tag.as_str() {
                            atoms::SCHEMA => return format!("{{ {} }}", self.row_fields(row, ": ")),
                            atoms::STRUCT => return format!("struct {{ {} }}", self.row_fields(row, " = ")),
                            atoms::LIST => {
                                let items: Vec<String> = row.fields().map(|(_, t)| self.print(t)).collect();
                                return format!("[{}]", items.join(", "));
                            }
                            _ => {}
                        }
                    }
                }
                let func = self.print(func);
                match icit {
                    Implicitness::Explicit => format!("{func} {}", self.atom(arg)),
                    Implicitness::Implicit => format!("{func} @{}", self.atom(arg)),
                }
            }
            Term::Abs { binding, body } => {
                let name = binding.variable().to_string();
                let body_printed = self.under([name.clone()], |p| p.print(body));
                match binding {
                    Binding::Lambda {
                        icit: Implicitness::Explicit,
                        ..
                    } => format!("\\{name} -> {body_printed}"),
                    Binding::Lambda { .. } => format!("\\{{{name}}} => {body_printed}"),
                    Binding::Pi {
                        icit,
                        multiplicity,
                        annotation,
                        ..
                    } => {
                        let q = quantity_prefix(*multiplicity);
                        match icit {
                            Implicitness::Implicit => format!("{{{q}{name}: {}}} => {body_printed}", self.print(annotation)),
                            Implicitness::Explicit if name == "_" && q.is_empty() => {
                                format!("{} -> {body_printed}", self.atom(annotation))
                            }
                            Implicitness::Explicit => format!("({q}{name}: {}) -> {body_printed}", self.print(annotation)),
                        }
                    }
                    Binding::Mu { annotation, .. } => format!("mu {name}: {}. {body_printed}", self.atom(annotation)),
                }
            }
            Term::Row(row) => format!("[{}]", self.row_fields(row, ": ")),
            Term::Proj { term, label } => format!("{}.{label}", self.atom(term)),
            Term::Inj { term, label, value } => {
                format!("{{ {} | {label} = {} }}", self.print(term), self.print(value))
            }
            Term::Match {
                scrutinee,
                alternatives,
            } => {
                let mut out = format!("match {}", self.print(scrutinee));
                for alt in alternatives {
                    out.push_str(&self.alternative(alt));
                }
                out
            }
            Term::Block { statements, ret } => {
                let before = self.names.len();
                let mut parts = Vec::new();
                for stmt in statements {
                    parts.push(match stmt {
                        Statement::Let {
                            variable,
                            value,
                            annotation,
                        } => {
                            let printed = format!("let {variable}: {} = {}", self.print(annotation), self.print(value));
                            self.names.push(variable.clone());
                            printed
                        }
                        Statement::Expression(t) => self.print(t),
                        Statement::Using(t) => format!("using {}", self.print(t)),
                    });
                }
                parts.push(format!("return {}", self.print(ret)));
                self.names.truncate(before);
                format!("{{ {}; }}", parts.join("; "))
            }
            Term::Modal { term, modalities } => {
                let mut out = format!("<{}> {}", modalities.quantity, self.atom(term));
                if let Some(liquid) = &modalities.liquid {
                    out.push_str(&format!(" [| {} |]", self.print(liquid)));
                }
                out
            }
            Term::Reset { handler, body } => match handler {
                Some(h) => format!("reset {} {}", self.atom(h), self.atom(body)),
                None => format!("reset {}", self.atom(body)),
            },
            Term::Shift { body, .. } => {
                let body = self.under(["resume".to_string()], |p| p.print(body));
                format!("shift {body}")
            }
        }
    }

    fn alternative(&mut self, alt: &Alternative) -> String {
        let body = self.under(alt.binders.iter().cloned(), |p| p.print(&alt.body));
        format!(" | {} -> {body}", alt.pattern)
    }

    fn row_fields(&mut self, row: &TermRow, separator: &str) -> String {
        let parts: Vec<String> = row
            .fields()
            .map(|(label, t)| format!("{label}{separator}{}", self.print(t)))
            .collect();
        let mut printed = parts.join(", ");
        if let Some(tail) = row.tail() {
            printed.push_str(&format!(" | {}", self.var(tail)));
        }
        printed
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use yap_ast::{Implicitness, Multiplicity, Row};

    use super::*;
    use crate::value::{Closure, Env};

    #[test]
    fn arrows_print_without_binder_names() {
        let ty = Value::pi(
            "_",
            Implicitness::Explicit,
            Multiplicity::Many,
            Value::atom(atoms::NUM),
            Closure::new(Env::empty(), Term::atom(atoms::BOOL)),
        );
        assert_eq!(ty.to_string(), "Num -> Bool");
    }

    #[test]
    fn dependent_pi_names_its_variable() {
        let ty = Value::pi(
            "x",
            Implicitness::Explicit,
            Multiplicity::One,
            Value::atom(atoms::NUM),
            Closure::new(Env::empty(), Term::app(Term::atom("Vec"), Term::bound(0))),
        );
        assert_eq!(ty.to_string(), "(1 x: Num) -> Vec x");
    }

    #[test]
    fn schemas_and_metas() {
        let meta = Meta {
            id: MetaId(3),
            level: Level(0),
        };
        let row = Row::extend("a", Value::atom(atoms::NUM), Row::Variable(Variable::Meta(meta)));
        assert_eq!(Value::schema(row).to_string(), "{ a: Num | ?3 }");
        assert_eq!(Value::flex(meta).to_string(), "?3");
    }

    #[test]
    fn rigid_levels_use_context_names() {
        let value = Value::Neutral(Rc::new(Value::app(Value::atom("F"), Value::rigid(Level(0)))));
        assert_eq!(display_value(&value, &["a".to_string()]), "F a");
        assert_eq!(value.to_string(), "F #0");
    }

    #[test]
    fn core_terms_print_binder_names() {
        let term = Term::lambda("x", Implicitness::Explicit, Term::app(Term::foreign("$add"), Term::bound(0)));
        assert_eq!(term.to_string(), "\\x -> $add x");
        assert_eq!(display_term(&Term::bound(0), &["y".to_string()]), "y");
    }
}
