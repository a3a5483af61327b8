// ABOUTME: Callable contract and its concrete variants: functions, lambdas, classes, instances

use crate::ast::FunctionDecl;
use crate::env::Environment;
use crate::interpreter::{Interpreter, Unwind};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Anything that can appear on the left of a `Call` expression.
pub trait Callable: fmt::Debug {
    fn arity(&self) -> usize;
    fn name(&self) -> &str;
    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, Unwind>;

    /// Rendered by `Value::Display`; classes override this with their bare name.
    fn display(&self) -> String {
        format!("{} :: t -> t1", self.name())
    }
}

/// A `fun` declaration or a class method, closed over its declaration-site environment.
#[derive(Debug)]
pub struct Function {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<Environment>,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<Environment>) -> Self {
        Function { declaration, closure }
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, Unwind> {
        let env = Environment::with_parent(Rc::clone(&self.closure));
        for (param, arg) in self.declaration.params.iter().zip(args.into_iter()) {
            env.define(param.lexeme.clone(), arg);
        }
        match interpreter.execute_block(&self.declaration.body, env) {
            Ok(()) => Ok(Value::Nil),
            Err(Unwind::Return(value)) => Ok(value),
            Err(other) => Err(other),
        }
    }
}

/// An anonymous `fun (...) { ... }` expression. Distinguished from `Function`
/// only by its name (rendered as `"Lambda"`) since it has no declared identifier.
#[derive(Debug)]
pub struct Lambda {
    pub params: Vec<crate::token::Token>,
    pub body: Vec<crate::ast::Stmt>,
    pub closure: Rc<Environment>,
}

impl Callable for Lambda {
    fn arity(&self) -> usize {
        self.params.len()
    }

    fn name(&self) -> &str {
        "Lambda"
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, Unwind> {
        let env = Environment::with_parent(Rc::clone(&self.closure));
        for (param, arg) in self.params.iter().zip(args.into_iter()) {
            env.define(param.lexeme.clone(), arg);
        }
        match interpreter.execute_block(&self.body, env) {
            Ok(()) => Ok(Value::Nil),
            Err(Unwind::Return(value)) => Ok(value),
            Err(other) => Err(other),
        }
    }
}

/// A bound method: a function plus the instance it was bound from. Held as
/// an owning reference — a call like `C().hello()` has no surviving binding
/// for the temporary instance by the time the `Call` expression invokes the
/// callable, so a non-owning handle would already be dangling.
#[derive(Debug)]
pub struct BoundMethod {
    pub method: Function,
    pub instance: Rc<Instance>,
}

impl Callable for BoundMethod {
    fn arity(&self) -> usize {
        self.method.arity()
    }

    fn name(&self) -> &str {
        self.method.name()
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, Unwind> {
        let this_scope = Environment::with_parent(Rc::clone(&self.method.closure));
        this_scope.define("this".to_string(), Value::Instance(Rc::clone(&self.instance)));
        let bound = Function {
            declaration: Rc::clone(&self.method.declaration),
            closure: this_scope,
        };
        bound.call(interpreter, args)
    }
}

/// The name and method table shared by a `Class` value and every `Instance`
/// constructed from it. Split out from `Class` so that `Class::call` can
/// build an `Instance` from `&self` without needing an `Rc<Class>` of
/// itself (classes are stored behind `Rc<dyn Callable>`, which erases the
/// concrete type) — it only needs to share this inner table.
#[derive(Debug)]
pub struct ClassData {
    pub class_name: String,
    pub methods: HashMap<String, Rc<Function>>,
}

impl ClassData {
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        self.methods.get(name).cloned()
    }
}

/// A class declaration: a name and its method table, both fixed at
/// declaration time. No user-defined constructor, no inheritance.
#[derive(Debug)]
pub struct Class {
    pub data: Rc<ClassData>,
}

impl Class {
    pub fn new(class_name: String, methods: HashMap<String, Rc<Function>>) -> Self {
        Class {
            data: Rc::new(ClassData { class_name, methods }),
        }
    }
}

impl Callable for Class {
    fn arity(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        &self.data.class_name
    }

    fn call(&self, _interpreter: &mut Interpreter, _args: Vec<Value>) -> Result<Value, Unwind> {
        Ok(Value::Instance(Instance::new(Rc::clone(&self.data))))
    }

    fn display(&self) -> String {
        self.data.class_name.clone()
    }
}

/// A live object: its class plus mutable field storage, created on first
/// assignment to each field.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<ClassData>,
    pub fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<ClassData>) -> Rc<Self> {
        Rc::new(Instance {
            class,
            fields: RefCell::new(HashMap::new()),
        })
    }

    pub fn get(self: &Rc<Self>, name: &str) -> Option<Value> {
        if let Some(value) = self.fields.borrow().get(name) {
            return Some(value.clone());
        }
        self.class.find_method(name).map(|method| {
            Value::Callable(Rc::new(BoundMethod {
                method: Function::new(Rc::clone(&method.declaration), Rc::clone(&method.closure)),
                instance: Rc::clone(self),
            }))
        })
    }

    pub fn set(&self, name: String, value: Value) {
        self.fields.borrow_mut().insert(name, value);
    }
}

/// A built-in callable registered directly into the global environment.
pub struct BuiltIn {
    pub builtin_name: &'static str,
    pub builtin_arity: usize,
    pub builtin_display: &'static str,
    pub func: Box<dyn Fn(&mut Interpreter, Vec<Value>) -> Result<Value, Unwind>>,
}

impl fmt::Debug for BuiltIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltIn({})", self.builtin_name)
    }
}

impl Callable for BuiltIn {
    fn arity(&self) -> usize {
        self.builtin_arity
    }

    fn name(&self) -> &str {
        self.builtin_name
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, Unwind> {
        (self.func)(interpreter, args)
    }

    fn display(&self) -> String {
        self.builtin_display.to_string()
    }
}
