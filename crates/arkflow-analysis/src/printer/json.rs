//! JSON export of a scene
//!
//! Every node carries a `_` field naming its kind. The tree mirrors the
//! model: file, namespace, class, method, body, CFG, block, statement, value.

use crate::error::{PrintError, PrintResult};
use arkflow_core::graph::{BasicBlock, Cfg};
use arkflow_core::ir::{
    ClassSignature, Constant, Expr, InvokeExpr, InvokeKind, Local, LocalTable, MethodSignature, Ref, Stmt, StmtKind,
    Type, Value,
};
use arkflow_core::model::{ArkBody, ArkClass, ArkField, ArkFile, ArkMethod, ArkNamespace, Scene};
use serde_json::{json, Value as Json};
use std::io::Write;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct JsonPrinter {
    positions: bool,
}

impl Default for JsonPrinter {
    fn default() -> Self {
        Self { positions: true }
    }
}

impl JsonPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave out statement line/column
    pub fn without_positions(mut self) -> Self {
        self.positions = false;
        self
    }

    pub fn print_scene(&self, scene: &Scene) -> PrintResult<Json> {
        let files = scene.files().map(|f| self.print_file(f)).collect::<PrintResult<Vec<_>>>()?;
        Ok(json!({
            "_": "Scene",
            "project": scene.project_name(),
            "files": files,
        }))
    }

    /// Pretty-printed scene written to `out`
    pub fn dump(&self, scene: &Scene, out: &mut impl Write) -> PrintResult<()> {
        let tree = self.print_scene(scene)?;
        serde_json::to_writer_pretty(&mut *out, &tree)?;
        out.write_all(b"\n")?;
        debug!(project = scene.project_name(), "scene exported as json");
        Ok(())
    }

    pub fn print_file(&self, file: &ArkFile) -> PrintResult<Json> {
        let namespaces = file
            .namespaces()
            .map(|ns| self.print_namespace(ns))
            .collect::<PrintResult<Vec<_>>>()?;
        let classes = file.classes().map(|c| self.print_class(c)).collect::<PrintResult<Vec<_>>>()?;
        let imports: Vec<Json> = file
            .import_infos()
            .iter()
            .map(|info| {
                json!({
                    "_": "ImportInfo",
                    "name": info.import_clause_name,
                    "from": info.from,
                    "original_name": info.name_before_as,
                })
            })
            .collect();
        let exports: Vec<Json> = file
            .export_infos()
            .map(|info| {
                json!({
                    "_": "ExportInfo",
                    "name": info.export_clause_name,
                    "original_name": info.name_before_as,
                    "from": info.from,
                })
            })
            .collect();
        Ok(json!({
            "_": "File",
            "project": file.signature().project_name,
            "name": file.name(),
            "namespaces": namespaces,
            "classes": classes,
            "imports": imports,
            "exports": exports,
        }))
    }

    fn print_namespace(&self, namespace: &ArkNamespace) -> PrintResult<Json> {
        let namespaces = namespace
            .namespaces()
            .map(|ns| self.print_namespace(ns))
            .collect::<PrintResult<Vec<_>>>()?;
        let classes = namespace.classes().map(|c| self.print_class(c)).collect::<PrintResult<Vec<_>>>()?;
        Ok(json!({
            "_": "Namespace",
            "name": namespace.name(),
            "namespaces": namespaces,
            "classes": classes,
        }))
    }

    pub fn print_class(&self, class: &ArkClass) -> PrintResult<Json> {
        let fields = class.fields().map(|f| self.print_field(f)).collect::<PrintResult<Vec<_>>>()?;
        let methods = class.methods().map(|m| self.print_method(m)).collect::<PrintResult<Vec<_>>>()?;
        Ok(json!({
            "_": "Class",
            "signature": class_signature(class.signature()),
            "category": format!("{:?}", class.category()),
            "super_class": class.super_class_name(),
            "implements": class.implemented_interfaces(),
            "decorators": class.decorators(),
            "fields": fields,
            "methods": methods,
        }))
    }

    fn print_field(&self, field: &ArkField) -> PrintResult<Json> {
        Ok(json!({
            "_": "Field",
            "name": field.name(),
            "type": print_type(field.ty())?,
            "static": field.is_static(),
            "initialized": field.has_initializer(),
        }))
    }

    pub fn print_method(&self, method: &ArkMethod) -> PrintResult<Json> {
        let body = match method.body() {
            Some(body) => self.print_body(body)?,
            None => Json::Null,
        };
        Ok(json!({
            "_": "Method",
            "signature": method_signature(method.signature())?,
            "decorators": method.decorators(),
            "body": body,
        }))
    }

    fn print_body(&self, body: &ArkBody) -> PrintResult<Json> {
        let locals = body.locals();
        let mut local_nodes = Vec::new();
        for (_, local) in body.local_names() {
            local_nodes.push(print_local(local, locals)?);
        }
        Ok(json!({
            "_": "Body",
            "locals": local_nodes,
            "cfg": self.print_cfg(body.cfg(), locals)?,
        }))
    }

    pub fn print_cfg(&self, cfg: &Cfg, locals: &LocalTable) -> PrintResult<Json> {
        let blocks = cfg
            .blocks()
            .map(|b| self.print_block(cfg, b, locals))
            .collect::<PrintResult<Vec<_>>>()?;
        Ok(json!({
            "_": "Cfg",
            "blocks": blocks,
        }))
    }

    fn print_block(&self, cfg: &Cfg, block: &BasicBlock, locals: &LocalTable) -> PrintResult<Json> {
        let mut stmts = Vec::with_capacity(block.len());
        for &id in block.stmts() {
            let stmt = cfg.stmt(id).ok_or(PrintError::DanglingStmt(id))?;
            stmts.push(self.print_stmt(stmt, locals)?);
        }
        Ok(json!({
            "_": "BasicBlock",
            "id": block.id.0,
            "successors": block.successors().iter().map(|b| b.0).collect::<Vec<_>>(),
            "predecessors": block.predecessors().iter().map(|b| b.0).collect::<Vec<_>>(),
            "stmts": stmts,
        }))
    }

    pub fn print_stmt(&self, stmt: &Stmt, locals: &LocalTable) -> PrintResult<Json> {
        let mut node = match &stmt.kind {
            StmtKind::Assign { left, right } => json!({
                "_": "AssignStmt",
                "left": print_value(left, locals)?,
                "right": print_value(right, locals)?,
            }),
            StmtKind::Invoke(invoke) => json!({
                "_": "InvokeStmt",
                "expr": print_invoke(invoke, locals)?,
            }),
            StmtKind::If(cond) => json!({
                "_": "IfStmt",
                "condition": {
                    "_": "ConditionExpr",
                    "op1": print_value(&cond.op1, locals)?,
                    "op2": print_value(&cond.op2, locals)?,
                    "operator": cond.operator.symbol(),
                },
            }),
            StmtKind::Return(value) => json!({
                "_": "ReturnStmt",
                "arg": print_value(value, locals)?,
            }),
            StmtKind::ReturnVoid => json!({ "_": "ReturnVoidStmt" }),
            StmtKind::Switch { key, cases } => json!({
                "_": "SwitchStmt",
                "key": print_value(key, locals)?,
                "cases": cases.iter().map(|c| print_value(c, locals)).collect::<PrintResult<Vec<_>>>()?,
            }),
            StmtKind::Throw(value) => json!({
                "_": "ThrowStmt",
                "arg": print_value(value, locals)?,
            }),
        };
        node["text"] = json!(stmt.to_string());
        if self.positions {
            node["line"] = json!(stmt.position.line);
            node["col"] = json!(stmt.position.col);
        }
        Ok(node)
    }
}

fn class_signature(sig: &ClassSignature) -> Json {
    json!({
        "_": "ClassSignature",
        "name": sig.name,
        "file": sig.file.file_name,
        "namespace": sig.namespace.as_ref().map(|ns| ns.to_string()),
    })
}

fn method_signature(sig: &MethodSignature) -> PrintResult<Json> {
    let mut parameters = Vec::with_capacity(sig.sub.parameters.len());
    for param in &sig.sub.parameters {
        parameters.push(json!({
            "_": "MethodParameter",
            "name": param.name,
            "type": print_type(&param.ty)?,
            "optional": param.optional,
            "rest": param.rest,
        }));
    }
    Ok(json!({
        "_": "MethodSignature",
        "declaring_class": class_signature(&sig.declaring_class),
        "name": sig.sub.name,
        "parameters": parameters,
        "return_type": print_type(&sig.sub.return_type)?,
        "static": sig.sub.is_static,
    }))
}

fn print_local(local: &Local, locals: &LocalTable) -> PrintResult<Json> {
    Ok(json!({
        "_": "Local",
        "name": local.name,
        "type": print_type(&locals.type_of(local))?,
    }))
}

fn print_constant(constant: &Constant) -> PrintResult<Json> {
    Ok(json!({
        "_": "Constant",
        "value": constant.value(),
        "type": print_type(constant.ty())?,
    }))
}

fn print_types(types: &[Type]) -> PrintResult<Vec<Json>> {
    types.iter().map(print_type).collect()
}

fn print_generics(types: &Option<Vec<Type>>) -> PrintResult<Json> {
    match types {
        Some(types) => Ok(Json::Array(print_types(types)?)),
        None => Ok(Json::Null),
    }
}

pub fn print_type(ty: &Type) -> PrintResult<Json> {
    let node = match ty {
        Type::Any => json!({ "_": "AnyType" }),
        Type::Unknown => json!({ "_": "UnknownType" }),
        Type::Void => json!({ "_": "VoidType" }),
        Type::Never => json!({ "_": "NeverType" }),
        Type::Undefined => json!({ "_": "UndefinedType" }),
        Type::Null => json!({ "_": "NullType" }),
        Type::Boolean => json!({ "_": "BooleanType" }),
        Type::Number => json!({ "_": "NumberType" }),
        Type::String => json!({ "_": "StringType" }),
        Type::BigInt => json!({ "_": "BigIntType" }),
        Type::Literal(literal) => json!({
            "_": "LiteralType",
            "literal": ty.to_string(),
            "widened": print_type(&literal.widen())?,
        }),
        Type::Union(types) => json!({
            "_": "UnionType",
            "types": print_types(types)?,
        }),
        Type::Tuple(types) => json!({
            "_": "TupleType",
            "types": print_types(types)?,
        }),
        Type::Array { base, dimension } => json!({
            "_": "ArrayType",
            "base": print_type(base)?,
            "dimension": dimension,
        }),
        Type::Class {
            signature,
            real_generic_types,
        } => json!({
            "_": "ClassType",
            "signature": class_signature(signature),
            "real_generic_types": print_generics(real_generic_types)?,
        }),
        Type::Function {
            signature,
            real_generic_types,
        } => json!({
            "_": "FunctionType",
            "signature": signature.to_string(),
            "real_generic_types": print_generics(real_generic_types)?,
        }),
        Type::UnclearReference { name, generic_types } => json!({
            "_": "UnclearReferenceType",
            "name": name,
            "generic_types": print_types(generic_types)?,
        }),
        Type::Generic { name, index, default } => json!({
            "_": "GenericType",
            "name": name,
            "index": index,
            "default": match default {
                Some(d) => print_type(d)?,
                None => Json::Null,
            },
        }),
        Type::Alias {
            name,
            original,
            real_generic_types,
        } => json!({
            "_": "AliasType",
            "name": name,
            "original": print_type(original)?,
            "real_generic_types": print_generics(real_generic_types)?,
        }),
    };
    Ok(node)
}

pub fn print_value(value: &Value, locals: &LocalTable) -> PrintResult<Json> {
    match value {
        Value::Local(local) => print_local(local, locals),
        Value::Constant(constant) => print_constant(constant),
        Value::Ref(r) => print_ref(r, locals),
        Value::Expr(expr) => print_expr(expr, locals),
    }
}

fn print_ref(r: &Ref, locals: &LocalTable) -> PrintResult<Json> {
    let node = match r {
        Ref::InstanceField { base, field } => json!({
            "_": "InstanceFieldRef",
            "base": print_local(base, locals)?,
            "field": field.to_string(),
            "type": print_type(&field.ty)?,
        }),
        Ref::StaticField { field } => json!({
            "_": "StaticFieldRef",
            "field": field.to_string(),
            "type": print_type(&field.ty)?,
        }),
        Ref::Array { base, index } => json!({
            "_": "ArrayRef",
            "base": print_local(base, locals)?,
            "index": print_value(index, locals)?,
        }),
        Ref::Parameter { index, param_type } => json!({
            "_": "ParameterRef",
            "index": index,
            "type": print_type(param_type)?,
        }),
        Ref::This { ty } => json!({
            "_": "ThisRef",
            "type": print_type(ty)?,
        }),
        Ref::CaughtException { ty } => json!({
            "_": "CaughtExceptionRef",
            "type": print_type(ty)?,
        }),
        Ref::Global { name, ref_value } => json!({
            "_": "GlobalRef",
            "name": name,
            "ref": match ref_value {
                Some(v) => print_value(v, locals)?,
                None => Json::Null,
            },
        }),
    };
    Ok(node)
}

fn print_invoke(invoke: &InvokeExpr, locals: &LocalTable) -> PrintResult<Json> {
    let args = invoke
        .args
        .iter()
        .map(|a| print_value(a, locals))
        .collect::<PrintResult<Vec<_>>>()?;
    let mut node = match &invoke.kind {
        InvokeKind::Instance { base } => json!({
            "_": "InstanceCallExpr",
            "instance": print_local(base, locals)?,
        }),
        InvokeKind::Static => json!({ "_": "StaticCallExpr" }),
        InvokeKind::Ptr { func_ptr } => json!({
            "_": "PtrCallExpr",
            "ptr": print_value(func_ptr, locals)?,
        }),
    };
    node["method"] = json!(invoke.method_signature.to_string());
    node["args"] = Json::Array(args);
    node["real_generic_types"] = print_generics(&invoke.real_generic_types)?;
    Ok(node)
}

fn print_expr(expr: &Expr, locals: &LocalTable) -> PrintResult<Json> {
    let unary = |kind: &str, arg: &Value| -> PrintResult<Json> {
        Ok(json!({
            "_": kind,
            "arg": print_value(arg, locals)?,
        }))
    };
    match expr {
        Expr::Invoke(invoke) => print_invoke(invoke, locals),
        Expr::New { class_type } => Ok(json!({
            "_": "NewExpr",
            "type": print_type(class_type)?,
        })),
        Expr::NewArray {
            base_type,
            size,
            from_literal,
        } => Ok(json!({
            "_": "NewArrayExpr",
            "type": print_type(base_type)?,
            "size": print_value(size, locals)?,
            "from_literal": from_literal,
        })),
        Expr::Delete(arg) => unary("DeleteExpr", arg),
        Expr::Await(arg) => unary("AwaitExpr", arg),
        Expr::Yield(arg) => unary("YieldExpr", arg),
        Expr::TypeOf(arg) => unary("TypeOfExpr", arg),
        Expr::InstanceOf { op, check_type } => Ok(json!({
            "_": "InstanceOfExpr",
            "arg": print_value(op, locals)?,
            "check_type": print_type(check_type)?,
        })),
        Expr::Cast { op, ty } => Ok(json!({
            "_": "CastExpr",
            "arg": print_value(op, locals)?,
            "type": print_type(ty)?,
        })),
        Expr::Phi { args, ty } => Ok(json!({
            "_": "PhiExpr",
            "args": args
                .iter()
                .map(|arg| print_local(arg, locals))
                .collect::<PrintResult<Vec<_>>>()?,
            "type": print_type(ty)?,
        })),
        Expr::Unop { op, operator } => Ok(json!({
            "_": "UnopExpr",
            "arg": print_value(op, locals)?,
            "operator": operator.symbol(),
        })),
        Expr::Binop {
            op1,
            op2,
            operator,
            ty,
        } => Ok(json!({
            "_": "BinopExpr",
            "left": print_value(op1, locals)?,
            "right": print_value(op2, locals)?,
            "operator": operator.symbol(),
            "type": print_type(ty)?,
        })),
        Expr::Condition(cond) => Ok(json!({
            "_": "ConditionExpr",
            "op1": print_value(&cond.op1, locals)?,
            "op2": print_value(&cond.op2, locals)?,
            "operator": cond.operator.symbol(),
        })),
    }
}
