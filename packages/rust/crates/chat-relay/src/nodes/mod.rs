mod gateway;

pub(crate) use gateway::run_gateway_mode;
