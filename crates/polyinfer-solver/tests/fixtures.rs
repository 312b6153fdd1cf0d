//! A small class library shared by the solver tests.
//!
//! ```java
//! interface List<E> {}
//! class ArrayList<E> implements List<E> {}
//! interface Comparable<T> { int compareTo(T o); }
//! interface Comparator<T> { int compare(T a, T b); boolean equals(Object o); }
//! interface Function<T, R> { R apply(T t); }
//! interface Supplier<T> { T get(); }
//! interface Consumer<T> { void accept(T t); }
//! interface Runnable { void run(); }
//! interface Callable<V> { V call() throws Exception; }
//! interface ThrowingRunnable<X extends Throwable> { void run() throws X; }
//! class IOException extends Exception {}
//! final class String implements Comparable<String> {}
//! ```

use crate::container::InferenceContext;
use crate::def::{DefId, MethodSig};
use crate::expr::ExprArena;
use crate::intern::TypeInterner;
use crate::relations::NominalOracle;
use crate::types::{TypeId, TypeParamId};

pub(crate) struct Library {
    pub db: TypeInterner,
    pub list: DefId,
    pub array_list: DefId,
    pub comparable: DefId,
    pub comparator: DefId,
    pub function: DefId,
    pub supplier: DefId,
    pub consumer: DefId,
    pub runnable: DefId,
    pub callable: DefId,
    pub throwing_runnable: DefId,
    pub io_exception: TypeId,
}

impl Library {
    pub(crate) fn new() -> Self {
        let db = TypeInterner::new();

        let e = db.fresh_type_param("E");
        let list = db.declare_interface("List", &[e]);
        let e = db.fresh_type_param("E");
        let array_list = db.declare_class("ArrayList", &[e]);
        db.defs()
            .add_supertype(array_list, db.apply1(list, db.type_param(e)));

        let t = db.fresh_type_param("T");
        let comparable = db.declare_interface("Comparable", &[t]);
        db.defs().add_abstract_method(
            comparable,
            MethodSig::new(db.intern_string("compareTo"), vec![db.type_param(t)], TypeId::INT),
        );
        db.defs()
            .add_supertype(DefId::STRING, db.apply1(comparable, TypeId::STRING));

        let t = db.fresh_type_param("T");
        let comparator = db.declare_interface("Comparator", &[t]);
        db.defs().add_abstract_method(
            comparator,
            MethodSig::new(
                db.intern_string("compare"),
                vec![db.type_param(t), db.type_param(t)],
                TypeId::INT,
            ),
        );
        db.defs().add_abstract_method(
            comparator,
            MethodSig::new(db.intern_string("equals"), vec![TypeId::OBJECT], TypeId::BOOLEAN),
        );

        let t = db.fresh_type_param("T");
        let r = db.fresh_type_param("R");
        let function = db.declare_interface("Function", &[t, r]);
        db.defs().add_abstract_method(
            function,
            MethodSig::new(
                db.intern_string("apply"),
                vec![db.type_param(t)],
                db.type_param(r),
            ),
        );

        let t = db.fresh_type_param("T");
        let supplier = db.declare_interface("Supplier", &[t]);
        db.defs().add_abstract_method(
            supplier,
            MethodSig::new(db.intern_string("get"), vec![], db.type_param(t)),
        );

        let t = db.fresh_type_param("T");
        let consumer = db.declare_interface("Consumer", &[t]);
        db.defs().add_abstract_method(
            consumer,
            MethodSig::new(db.intern_string("accept"), vec![db.type_param(t)], TypeId::VOID),
        );

        let runnable = db.declare_interface("Runnable", &[]);
        db.defs().add_abstract_method(
            runnable,
            MethodSig::new(db.intern_string("run"), vec![], TypeId::VOID),
        );

        let v = db.fresh_type_param("V");
        let callable = db.declare_interface("Callable", &[v]);
        db.defs().add_abstract_method(
            callable,
            MethodSig::new(db.intern_string("call"), vec![], db.type_param(v))
                .with_thrown(vec![TypeId::EXCEPTION]),
        );

        let x = db.fresh_type_param("X");
        db.set_type_param_bound(x, TypeId::THROWABLE);
        let throwing_runnable = db.declare_interface("ThrowingRunnable", &[x]);
        db.defs().add_abstract_method(
            throwing_runnable,
            MethodSig::new(db.intern_string("run"), vec![], TypeId::VOID)
                .with_thrown(vec![db.type_param(x)]),
        );

        let io = db.declare_class("IOException", &[]);
        db.defs().add_supertype(io, TypeId::EXCEPTION);
        let io_exception = db.raw(io);

        Self {
            db,
            list,
            array_list,
            comparable,
            comparator,
            function,
            supplier,
            consumer,
            runnable,
            callable,
            throwing_runnable,
            io_exception,
        }
    }

    pub(crate) fn oracle(&self) -> NominalOracle<'_> {
        NominalOracle::new(&self.db)
    }

    /// Fresh method type parameters.
    pub(crate) fn type_params(&self, names: &[&str]) -> Vec<TypeParamId> {
        names.iter().map(|n| self.db.fresh_type_param(n)).collect()
    }

    pub(crate) fn tp(&self, param: TypeParamId) -> TypeId {
        self.db.type_param(param)
    }

    /// A method signature with the given type parameters.
    pub(crate) fn method(
        &self,
        name: &str,
        type_params: &[TypeParamId],
        params: Vec<TypeId>,
        return_type: TypeId,
    ) -> MethodSig {
        MethodSig::new(self.db.intern_string(name), params, return_type)
            .with_type_params(type_params.iter().copied())
    }

    pub(crate) fn list_of(&self, element: TypeId) -> TypeId {
        self.db.apply1(self.list, element)
    }

    pub(crate) fn comparator_of(&self, element: TypeId) -> TypeId {
        self.db.apply1(self.comparator, element)
    }

    pub(crate) fn function_of(&self, input: TypeId, output: TypeId) -> TypeId {
        self.db.apply(self.function, &[input, output])
    }

    /// `<T> T id(T t)`
    pub(crate) fn identity(&self) -> MethodSig {
        let t = self.type_params(&["T"]);
        self.method("id", &t, vec![self.tp(t[0])], self.tp(t[0]))
    }

    pub(crate) fn context<'a>(
        &'a self,
        oracle: &'a NominalOracle<'a>,
        exprs: &'a ExprArena,
    ) -> InferenceContext<'a> {
        InferenceContext::new(&self.db, oracle, exprs)
    }
}
