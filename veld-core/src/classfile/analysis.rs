//! 栈深度与局部变量分析
//!
//! 对直线型（无分支）指令序列做一次前向模拟，得到 max_stack 与 max_locals。

use super::descriptor::MethodType;
use super::error::AnalysisError;
use super::insn::Insn;

/// 方法的栈与局部变量容量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxValues {
    pub max_stack: u16,
    pub max_locals: u16,
}

/// 计算指令序列所需的 max_stack / max_locals
///
/// 参数（以及实例方法的 `this`）占用的槽位总会计入 max_locals。
pub fn compute_maxs(
    insns: &[Insn],
    method_type: &MethodType,
    is_static: bool,
) -> Result<MaxValues, AnalysisError> {
    let mut max_locals = method_type.param_slots() + if is_static { 0 } else { 1 };
    let mut depth: u32 = 0;
    let mut max_stack: u32 = 0;

    for (index, insn) in insns.iter().enumerate() {
        let (pops, pushes) = insn.stack_effect()?;
        if depth < pops {
            return Err(AnalysisError::StackUnderflow { index });
        }
        depth = depth - pops + pushes;
        max_stack = max_stack.max(depth);
        max_locals = max_locals.max(insn.locals_needed());
    }

    if !insns.last().is_some_and(Insn::is_terminal) {
        return Err(AnalysisError::FallsOffEnd);
    }

    Ok(MaxValues {
        max_stack: u16::try_from(max_stack)
            .map_err(|_| AnalysisError::TooLarge { what: "max_stack" })?,
        max_locals: u16::try_from(max_locals)
            .map_err(|_| AnalysisError::TooLarge { what: "max_locals" })?,
    })
}
