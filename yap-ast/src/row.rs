use std::fmt;

/// An extensible labelled row, terminated either by `Empty` or by a
/// polymorphic tail `Variable`.
///
/// The same shape is reused by surface terms, core terms and semantic values,
/// which is why both the payload `T` and the tail `V` are generic.
/// Labels are neither sorted nor checked for uniqueness.
#[derive(Clone, Debug, PartialEq)]
pub enum Row<T, V> {
    Empty,
    Extension {
        label: String,
        value: Box<T>,
        rest: Box<Row<T, V>>,
    },
    Variable(V),
}

impl<T, V> Row<T, V> {
    pub fn extend(label: impl Into<String>, value: T, rest: Row<T, V>) -> Self {
        Row::Extension {
            label: label.into(),
            value: Box::new(value),
            rest: Box::new(rest),
        }
    }

    /// Builds a row from fields in order, ending with `tail`.
    pub fn from_fields<I>(fields: I, tail: Row<T, V>) -> Self
    where
        I: IntoIterator<Item = (String, T)>,
    {
        let fields: Vec<_> = fields.into_iter().collect();
        fields
            .into_iter()
            .rev()
            .fold(tail, |rest, (label, value)| Row::extend(label, value, rest))
    }

    pub fn fields(&self) -> Fields<'_, T, V> {
        Fields { row: self }
    }

    /// The polymorphic tail, if the row is open.
    pub fn tail(&self) -> Option<&V> {
        let mut row = self;
        loop {
            match row {
                Row::Empty => return None,
                Row::Extension { rest, .. } => row = &**rest,
                Row::Variable(v) => return Some(v),
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&T> {
        self.fields().find(|(l, _)| *l == label).map(|(_, v)| v)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.fields().map(|(l, _)| l).collect()
    }

    pub fn len(&self) -> usize {
        self.fields().count()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Row::Empty)
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Row<U, V>
    where
        V: Clone,
    {
        self.try_map::<U, std::convert::Infallible>(|t| Ok(f(t)))
            .unwrap_or_else(|never| match never {})
    }

    pub fn try_map<U, E>(&self, mut f: impl FnMut(&T) -> Result<U, E>) -> Result<Row<U, V>, E>
    where
        V: Clone,
    {
        self.traverse(&mut f, &mut |v: &V| Ok(Row::Variable(v.clone())))
    }

    /// Maps payloads with `f` and replaces the tail with whatever row `g`
    /// produces, splicing it in place.
    pub fn traverse<U, W, E>(
        &self,
        f: &mut impl FnMut(&T) -> Result<U, E>,
        g: &mut impl FnMut(&V) -> Result<Row<U, W>, E>,
    ) -> Result<Row<U, W>, E> {
        let mut fields = Vec::new();
        let mut row = self;
        let tail = loop {
            match row {
                Row::Empty => break Row::Empty,
                Row::Extension { label, value, rest } => {
                    fields.push((label.clone(), f(&**value)?));
                    row = &**rest;
                }
                Row::Variable(v) => break g(v)?,
            }
        };
        Ok(Row::from_fields(fields, tail))
    }

    /// Replaces the value of the first field named `label`, or prepends it.
    pub fn insert(&self, label: &str, value: T) -> Row<T, V>
    where
        T: Clone,
        V: Clone,
    {
        if self.get(label).is_none() {
            return Row::extend(label, value, self.clone());
        }
        let mut value = Some(value);
        let fields = self.fields().map(|(l, v)| {
            let v = match (l == label, value.take()) {
                (true, Some(new)) => new,
                (_, taken) => {
                    value = taken;
                    v.clone()
                }
            };
            (l.to_string(), v)
        });
        let fields: Vec<_> = fields.collect();
        let tail = match self.tail() {
            Some(v) => Row::Variable(v.clone()),
            None => Row::Empty,
        };
        Row::from_fields(fields, tail)
    }
}

pub struct Fields<'a, T, V> {
    row: &'a Row<T, V>,
}

impl<'a, T, V> Iterator for Fields<'a, T, V> {
    type Item = (&'a str, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        match self.row {
            Row::Extension { label, value, rest } => {
                self.row = &**rest;
                Some((label.as_str(), &**value))
            }
            _ => None,
        }
    }
}

impl<T: fmt::Display, V: fmt::Display> fmt::Display for Row<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (label, value)) in self.fields().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{label}: {value}")?;
        }
        if let Some(tail) = self.tail() {
            write!(f, " | {tail}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::Row;

    type R = Row<i32, &'static str>;

    #[test]
    fn from_fields_preserves_order() {
        let row: R = Row::from_fields(vec![("a".into(), 1), ("b".into(), 2)], Row::Variable("r"));
        assert_eq!(row.labels(), vec!["a", "b"]);
        assert_eq!(row.tail(), Some(&"r"));
        assert_eq!(row.get("b"), Some(&2));
        assert_eq!(row.to_string(), "[a: 1, b: 2 | r]");
    }

    #[test]
    fn insert_replaces_first_occurrence_only() {
        let row: R = Row::from_fields(vec![("a".into(), 1), ("a".into(), 2)], Row::Empty);
        let updated = row.insert("a", 9);
        assert_eq!(updated.fields().map(|(_, v)| *v).collect::<Vec<_>>(), vec![9, 2]);

        let extended = row.insert("c", 3);
        assert_eq!(extended.labels(), vec!["c", "a", "a"]);
    }

    #[test]
    fn traverse_splices_tail() {
        let row: R = Row::extend("a", 1, Row::Variable("r"));
        let spliced: Result<Row<i32, ()>, ()> =
            row.traverse(&mut |v: &i32| Ok(v * 10), &mut |_: &&str| Ok(Row::extend("b", 20, Row::Empty)));
        let spliced = spliced.expect("traverse");
        assert_eq!(spliced.labels(), vec!["a", "b"]);
        assert_eq!(spliced.get("a"), Some(&10));
        assert!(spliced.tail().is_none());
    }
}
