//! Template execution against a request context.

use super::coerce::{is_true, to_text};
use super::funcs::{apply, Func};
use super::parser::{Command, Node, Operand, Pipeline};
use super::ExecError;
use crate::context::RequestContext;
use serde_json::Value;

pub(crate) fn render_nodes(
    nodes: &[Node],
    ctx: &RequestContext,
    out: &mut String,
) -> Result<(), ExecError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Action(pipeline) => out.push_str(&to_text(&eval_pipeline(pipeline, ctx)?)),
            Node::If {
                branches,
                otherwise,
            } => {
                let mut taken = false;
                for (condition, body) in branches {
                    if is_true(&eval_pipeline(condition, ctx)?) {
                        render_nodes(body, ctx, out)?;
                        taken = true;
                        break;
                    }
                }
                if !taken {
                    render_nodes(otherwise, ctx, out)?;
                }
            }
        }
    }
    Ok(())
}

fn eval_pipeline(pipeline: &Pipeline, ctx: &RequestContext) -> Result<Value, ExecError> {
    let mut result = Value::Null;
    for (i, command) in pipeline.commands.iter().enumerate() {
        let piped = if i == 0 {
            None
        } else {
            Some(std::mem::take(&mut result))
        };
        result = match command {
            Command::Operand(operand) => eval_operand(operand, ctx)?,
            Command::Call { func, args } => eval_call(*func, args, piped, ctx)?,
        };
    }
    Ok(result)
}

fn eval_call(
    func: Func,
    args: &[Operand],
    piped: Option<Value>,
    ctx: &RequestContext,
) -> Result<Value, ExecError> {
    match func {
        Func::And | Func::Or => {
            if args.is_empty() && piped.is_none() {
                return apply(func, &[]);
            }
            let stop_on = func == Func::Or;
            let mut last = Value::Null;
            for arg in args {
                last = eval_operand(arg, ctx)?;
                if is_true(&last) == stop_on {
                    return Ok(last);
                }
            }
            Ok(piped.unwrap_or(last))
        }
        _ => {
            let mut values = args
                .iter()
                .map(|arg| eval_operand(arg, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            values.extend(piped);
            apply(func, &values)
        }
    }
}

fn eval_operand(operand: &Operand, ctx: &RequestContext) -> Result<Value, ExecError> {
    match operand {
        Operand::Dot => Ok(ctx.to_value()),
        Operand::Field(path) => ctx
            .resolve(path)
            .ok_or_else(|| ExecError::InvalidField(format!(".{}", path.join(".")))),
        Operand::Literal(value) => Ok(value.clone()),
        Operand::Pipeline(pipeline) => eval_pipeline(pipeline, ctx),
    }
}
