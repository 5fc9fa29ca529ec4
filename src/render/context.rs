use crate::mapping::BindingDescriptor;
use crate::value::{Value, ValueMap};

/// Key under which a non-map extra parameter is exposed.
pub const ADDITIONAL_PARAMETER_KEY: &str = "additional_parameter";

/// Key under which the whole parameter object is exposed.
pub const PARAMETER_OBJECT_KEY: &str = "parameters";

#[derive(Clone, Copy, Debug)]
enum Extra<'a> {
    None,
    Map(&'a ValueMap),
    Synthetic(&'a Value),
}

/// Resolution scope for one render call: the parameter object plus optional
/// extra parameters. Parameter-object values shadow extras.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext<'a> {
    parameter: &'a Value,
    extra: Extra<'a>,
}

fn strip_key<'p>(path: &'p str, key: &str) -> Option<&'p str> {
    let rest = path.strip_prefix(key)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('.')
    }
}

fn lookup_in<'v>(root: &'v Value, rest: &str) -> Option<&'v Value> {
    if rest.is_empty() {
        Some(root)
    } else {
        root.lookup(rest)
    }
}

impl<'a> RenderContext<'a> {
    /// Builds a context. A `Null` extra is ignored; a non-map extra is exposed
    /// under [`ADDITIONAL_PARAMETER_KEY`].
    pub fn new(parameter: &'a Value, extra: Option<&'a Value>) -> Self {
        let extra = match extra {
            None | Some(Value::Null) => Extra::None,
            Some(Value::Map(map)) => Extra::Map(map),
            Some(other) => Extra::Synthetic(other),
        };
        Self { parameter, extra }
    }

    /// The parameter object as supplied.
    pub fn parameter(&self) -> &'a Value {
        self.parameter
    }

    /// Resolves a dotted path, parameter object first, then extras.
    pub fn lookup(&self, path: &str) -> Option<&'a Value> {
        self.lookup_parameter(path).or_else(|| self.lookup_extra(path))
    }

    fn lookup_parameter(&self, path: &str) -> Option<&'a Value> {
        match self.parameter {
            Value::Null => None,
            Value::Map(_) | Value::List(_) => self.parameter.lookup(path).or_else(|| {
                strip_key(path, PARAMETER_OBJECT_KEY).and_then(|rest| lookup_in(self.parameter, rest))
            }),
            scalar => (path == PARAMETER_OBJECT_KEY).then_some(scalar),
        }
    }

    fn lookup_extra(&self, path: &str) -> Option<&'a Value> {
        match self.extra {
            Extra::None => None,
            Extra::Map(map) => {
                let (head, rest) = path.split_once('.').unwrap_or((path, ""));
                map.get(head).and_then(|v| lookup_in(v, rest))
            }
            Extra::Synthetic(value) => {
                strip_key(path, ADDITIONAL_PARAMETER_KEY).and_then(|rest| lookup_in(value, rest))
            }
        }
    }

    /// Resolves the value a binding descriptor feeds into its slot.
    ///
    /// List parameter objects are positional: a descriptor's 1-based `index`
    /// selects the element, otherwise the slot ordinal does. A scalar parameter
    /// object is the value of every descriptor.
    pub fn resolve_descriptor(&self, descriptor: &BindingDescriptor, ordinal: usize) -> Option<&'a Value> {
        match self.parameter {
            Value::List(items) => {
                let position = match descriptor.index() {
                    i if i > 0 => (i - 1) as usize,
                    _ => ordinal,
                };
                items.get(position)
            }
            Value::Map(_) | Value::Null => self.lookup(descriptor.property()),
            scalar => Some(scalar),
        }
    }
}
