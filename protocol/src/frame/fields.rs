use crate::{
    error::DecodeError,
    message::{
        Array, CollectionValue, DescribedValue, Descriptor, List, SimpleValue, Symbol, Value,
    },
};

/// A described list, the encoding used by every performative and by the
/// types nested inside them
pub trait Composite: Sized {
    const CODE: u64;
    const NAME: &'static str;

    /// Field values in declaration order, absent fields as null
    fn fields(&self) -> Vec<Value>;

    fn from_fields(fields: Fields<'_>) -> Result<Self, DecodeError>;

    fn to_value(&self) -> Value {
        let mut fields = self.fields();
        // trailing nulls can be omitted from the list
        while fields.last().is_some_and(Value::is_null) {
            fields.pop();
        }
        DescribedValue::new(Descriptor::Ulong(Self::CODE), List(fields)).into()
    }

    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let described = match value {
            Value::Described(described) if Self::matches(described.descriptor()) => described,
            other => {
                return Err(DecodeError::InvalidDescriptor(format!(
                    "Expected {} but found {:?}",
                    Self::NAME,
                    other
                )))
            }
        };
        match described.value() {
            Value::Collection(CollectionValue::List(list)) => Self::from_fields(Fields(&list.0)),
            Value::Simple(SimpleValue::Null) => Self::from_fields(Fields(&[])),
            other => Err(DecodeError::MessageParse(format!(
                "{} must be encoded as a list, found {:?}",
                Self::NAME,
                other
            ))),
        }
    }

    fn matches(descriptor: &Descriptor) -> bool {
        match descriptor {
            Descriptor::Ulong(code) => *code == Self::CODE,
            Descriptor::Symbol(symbol) => symbol.as_str() == Self::NAME,
        }
    }
}

/// Conversion of a single non-null field value
pub trait FromField: Sized {
    fn from_field(value: &Value) -> Result<Self, DecodeError>;
}

macro_rules! from_simple_field {
    ($ty:ty, $variant:ident) => {
        impl FromField for $ty {
            fn from_field(value: &Value) -> Result<Self, DecodeError> {
                match value {
                    Value::Simple(SimpleValue::$variant(inner)) => Ok(inner.clone()),
                    other => Err(DecodeError::MessageParse(format!(
                        "Expected {} but found {:?}",
                        stringify!($variant),
                        other
                    ))),
                }
            }
        }
    };
}

from_simple_field!(bool, Boolean);
from_simple_field!(u8, Ubyte);
from_simple_field!(u16, Ushort);
from_simple_field!(u32, Uint);
from_simple_field!(u64, Ulong);
from_simple_field!(String, String);
from_simple_field!(Vec<u8>, Binary);

impl FromField for Symbol {
    fn from_field(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Simple(SimpleValue::Symbol(symbol)) => Ok(symbol.clone()),
            // addresses are commonly sent as strings
            Value::Simple(SimpleValue::String(string)) => Ok(Symbol::from(string.as_str())),
            other => Err(DecodeError::MessageParse(format!(
                "Expected Symbol but found {:?}",
                other
            ))),
        }
    }
}

impl FromField for Value {
    fn from_field(value: &Value) -> Result<Self, DecodeError> {
        Ok(value.clone())
    }
}

/// Fields of a composite being decoded. Missing trailing fields read as null.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a>(pub &'a [Value]);

impl<'a> Fields<'a> {
    pub fn raw(&self, idx: usize) -> Option<&'a Value> {
        self.0.get(idx).filter(|value| !value.is_null())
    }

    pub fn get<T: FromField>(&self, idx: usize) -> Result<Option<T>, DecodeError> {
        self.raw(idx).map(T::from_field).transpose()
    }

    pub fn get_or<T: FromField>(&self, idx: usize, default: T) -> Result<T, DecodeError> {
        Ok(self.get(idx)?.unwrap_or(default))
    }

    pub fn required<T: FromField>(&self, idx: usize, name: &str) -> Result<T, DecodeError> {
        self.get(idx)?
            .ok_or_else(|| DecodeError::MessageParse(format!("Missing mandatory field {}", name)))
    }
}

/// Symbols of a `multiple="true"` field, sent either as one symbol or an array
pub fn symbols(value: Option<&Value>) -> Result<Vec<Symbol>, DecodeError> {
    match value {
        None => Ok(vec![]),
        Some(Value::Collection(CollectionValue::Array(array))) => {
            array.iter().map(Symbol::from_field).collect()
        }
        Some(single) => Symbol::from_field(single).map(|symbol| vec![symbol]),
    }
}

/// Encodes a `multiple="true"` symbol field as an array
pub fn symbol_array(symbols: &[Symbol]) -> Value {
    Array(symbols.iter().cloned().map(Value::from).collect()).into()
}
