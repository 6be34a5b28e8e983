use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::class::Class;
use crate::value::Value;

/// An object: shared handle over the owning class and a field map.  Fields
/// exist only through assignment at runtime; the class declares no storage.
#[derive(Clone)]
pub struct Instance<'a> {
    data: Rc<RefCell<InstanceData<'a>>>,
}

struct InstanceData<'a> {
    class: Class<'a>,
    fields: HashMap<String, Value<'a>>,
}

impl<'a> Instance<'a> {
    pub fn new(class: Class<'a>) -> Self {
        Instance {
            data: Rc::new(RefCell::new(InstanceData {
                class,
                fields: HashMap::new(),
            })),
        }
    }

    /// Property lookup: a field shadows a method of the same name.  A method
    /// hit is bound to this instance, producing a fresh function value whose
    /// closure layers `this`.
    pub fn get(&self, name: &str) -> Option<Value<'a>> {
        if let Some(value) = self.data.borrow().fields.get(name) {
            return Some(value.clone());
        }

        let class = self.data.borrow().class.clone();

        class
            .find_method(name)
            .map(|method| Value::Function(Rc::new(method.bind(self.clone()))))
    }

    /// Create or overwrite a field.
    pub fn set(&self, name: &str, value: Value<'a>) {
        self.data
            .borrow_mut()
            .fields
            .insert(name.to_string(), value);
    }

    /// Identity comparison (two handles to the same object).
    pub fn equals(&self, other: &Instance<'a>) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl<'a> fmt::Display for Instance<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.data.borrow().class.name())
    }
}

// Manual impl: fields can hold this very instance, so a derived Debug would
// recurse.
impl<'a> fmt::Debug for Instance<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.data.borrow().class.name())
    }
}
