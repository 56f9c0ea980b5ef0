use std::fmt;

use crate::{
    instruction::InstrId,
    value::{Value, ValueId},
};

use super::module::Module;

impl Module {
    // "%name = static <type>, <share>[, <init>, <val>]"
    pub fn dump_value(&self, id: ValueId) -> Option<String> {
        let value = self.value(id)?;
        let ty = self.get_type(value.get_type())?;
        let line = match value.as_static() {
            Some(var) => format!("{} = static {}", self.dump_label(value), var.extra_desc(ty)),
            None => format!("{} = result {}", self.dump_label(value), ty),
        };
        Some(line)
    }

    // "%result = <opcode> <extra> @out %dest, @in %src, ..."
    pub fn dump_instruction(&self, id: InstrId) -> Option<String> {
        let instr = self.instr(id)?;
        let result = instr
            .result()
            .and_then(|r| self.value(r))
            .map(|v| self.dump_label(v))
            .unwrap_or_else(|| id.to_string());

        let operands = instr
            .operands()
            .iter()
            .map(|op| {
                let label = self
                    .value(op.value)
                    .map(|v| self.dump_label(v))
                    .unwrap_or_else(|| format!("{}?", op.value));
                format!("@{} {}", op.kind, label)
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut line = format!("{} = {}", result, instr.opcode());
        let extra = instr.extra_desc();
        if !extra.is_empty() {
            line.push(' ');
            line.push_str(&extra);
        }
        if !operands.is_empty() {
            line.push(' ');
            line.push_str(&operands);
        }
        Some(line)
    }

    // Names may repeat, so the n-th repeat of a name prints as "%name.n"
    fn dump_label(&self, value: &Value) -> String {
        let Some(name) = value.name() else {
            return value.label();
        };
        let repeats = self
            .values()
            .iter()
            .take(value.id.0)
            .filter(|earlier| earlier.name() == Some(name))
            .count();
        match repeats {
            0 => value.label(),
            n => format!("%{}.{}", name, n),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "declare {{")?;
        for (value, _) in self.static_variables() {
            if let Some(line) = self.dump_value(value.id) {
                writeln!(f, "  {}", line)?;
            }
        }
        writeln!(f, "}}")?;
        writeln!(f)?;

        writeln!(f, "program {{")?;
        for idx in 0..self.instrs().len() {
            if let Some(line) = self.dump_instruction(InstrId(idx)) {
                writeln!(f, "  {}", line)?;
            }
        }
        writeln!(f, "}}")
    }
}
