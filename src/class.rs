use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::callable::Function;

/// A class value: shared handle over the class's name, optional superclass,
/// and method table.  Cloning the handle clones the `Rc`, so every reference
/// to one declaration observes the same identity.
#[derive(Clone)]
pub struct Class<'a> {
    data: Rc<ClassData<'a>>,
}

struct ClassData<'a> {
    name: String,
    superclass: Option<Class<'a>>,
    methods: HashMap<String, Rc<Function<'a>>>,
}

impl<'a> Class<'a> {
    pub fn new(
        name: &str,
        superclass: Option<Class<'a>>,
        methods: HashMap<String, Rc<Function<'a>>>,
    ) -> Self {
        Class {
            data: Rc::new(ClassData {
                name: name.to_string(),
                superclass,
                methods,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Look up `name` on this class, then up the superclass chain.  Overrides
    /// win because the walk starts here.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function<'a>>> {
        if let Some(method) = self.data.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.data
            .superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// Constructor arity: the `init` method's arity, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method("init")
            .map(|init| init.arity())
            .unwrap_or(0)
    }

    /// Identity comparison (two names for the same class value).
    pub fn equals(&self, other: &Class<'a>) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl<'a> fmt::Display for Class<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data.name)
    }
}

impl<'a> fmt::Debug for Class<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.data.name)
    }
}
