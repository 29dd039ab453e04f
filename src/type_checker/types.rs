//! Resolved types and the registry that owns record and array definitions.
//!
//! Records and arrays have name identity: each declaration site gets its own
//! entry in the [`TypeRegistry`] and the [`Ty`] handle refers to it by index,
//! so two handles are the same type exactly when their indices match.

pub type TypeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    Int,
    String,
    Void,
    /// Type of `nil`, accepted wherever a record is expected.
    Nil,
    Record(TypeId),
    Array(TypeId),
    /// Sentinel for nodes that failed to check.
    Error,
}

impl Ty {
    pub fn is_record(&self) -> bool {
        matches!(self, Ty::Record(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Ty::Error)
    }
}

#[derive(Debug, Clone)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<(String, Ty)>,
    /// False while the record is still a forward-declared placeholder.
    pub complete: bool,
}

#[derive(Debug, Clone)]
pub struct ArrayType {
    pub name: String,
    pub element: Ty,
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    records: Vec<RecordType>,
    arrays: Vec<ArrayType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an opaque record whose fields are filled in later.
    pub fn new_record(&mut self, name: &str) -> Ty {
        self.records.push(RecordType {
            name: name.to_string(),
            fields: vec![],
            complete: false,
        });
        Ty::Record(self.records.len() - 1)
    }

    pub fn complete_record(&mut self, id: TypeId, fields: Vec<(String, Ty)>) {
        if let Some(record) = self.records.get_mut(id) {
            record.fields = fields;
            record.complete = true;
        }
    }

    pub fn new_array(&mut self, name: &str, element: Ty) -> Ty {
        self.arrays.push(ArrayType {
            name: name.to_string(),
            element,
        });
        Ty::Array(self.arrays.len() - 1)
    }

    pub fn record(&self, id: TypeId) -> Option<&RecordType> {
        self.records.get(id)
    }

    pub fn array(&self, id: TypeId) -> Option<&ArrayType> {
        self.arrays.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = (TypeId, &RecordType)> {
        self.records.iter().enumerate()
    }

    /// Position and type of `field` within the record `ty`.
    pub fn field(&self, ty: Ty, field: &str) -> Option<(usize, Ty)> {
        let Ty::Record(id) = ty else {
            return None;
        };
        self.record(id)?
            .fields
            .iter()
            .position(|(name, _)| name == field)
            .map(|index| (index, self.records[id].fields[index].1))
    }

    pub fn element(&self, ty: Ty) -> Option<Ty> {
        match ty {
            Ty::Array(id) => self.array(id).map(|array| array.element),
            _ => None,
        }
    }

    pub fn type_name(&self, ty: Ty) -> String {
        match ty {
            Ty::Int => String::from("int"),
            Ty::String => String::from("string"),
            Ty::Void => String::from("void"),
            Ty::Nil => String::from("nil"),
            Ty::Error => String::from("<error>"),
            Ty::Record(id) => self
                .record(id)
                .map(|record| record.name.clone())
                .unwrap_or_else(|| format!("record#{}", id)),
            Ty::Array(id) => self
                .array(id)
                .map(|array| array.name.clone())
                .unwrap_or_else(|| format!("array#{}", id)),
        }
    }

    /// Whether a value of type `received` may be used where `expected` is wanted.
    ///
    /// `nil` matches any record but never another `nil`, and the error
    /// sentinel matches everything so one mistake is reported once.
    pub fn compatible(&self, expected: Ty, received: Ty) -> bool {
        match (expected, received) {
            (Ty::Error, _) | (_, Ty::Error) => true,
            (Ty::Nil, Ty::Nil) => false,
            (Ty::Nil, Ty::Record(_)) | (Ty::Record(_), Ty::Nil) => true,
            (expected, received) => expected == received,
        }
    }

    /// Two records with the same field type sequence share a memory layout.
    pub fn same_layout(&self, a: Ty, b: Ty) -> bool {
        match (a, b) {
            (Ty::Record(a), Ty::Record(b)) => match (self.record(a), self.record(b)) {
                (Some(a), Some(b)) => {
                    a.fields.len() == b.fields.len()
                        && a.fields
                            .iter()
                            .zip(b.fields.iter())
                            .all(|((_, a), (_, b))| a == b)
                }
                _ => false,
            },
            (a, b) => a == b,
        }
    }
}
