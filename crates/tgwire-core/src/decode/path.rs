use std::fmt;

/// One step into a JSON document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    Key(&'static str),
    Index(usize),
}

/// Location of a node, printed as `message.reply_to_message.entities[2].offset`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::Key(k) if i == 0 => f.write_str(k)?,
                Segment::Key(k) => write!(f, ".{k}")?,
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_keys_and_indices() {
        let mut p = FieldPath::root();
        assert_eq!(p.to_string(), "<root>");
        p.push(Segment::Key("result"));
        p.push(Segment::Index(0));
        p.push(Segment::Key("message"));
        assert_eq!(p.to_string(), "result[0].message");
        p.pop();
        assert_eq!(p.to_string(), "result[0]");
    }

    #[test]
    fn leading_index_has_no_dot() {
        let p = FieldPath::from_segments(vec![Segment::Index(3), Segment::Key("type")]);
        assert_eq!(p.to_string(), "[3].type");
    }
}
