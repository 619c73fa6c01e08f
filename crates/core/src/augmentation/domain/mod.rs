pub mod freezable_state;
pub mod operator;
pub mod parameter_record;
pub mod parameter_space;
pub mod random_gate;
pub mod randomizer;
pub mod transform;
