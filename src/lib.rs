//! Planexec - Plan-and-Execute 任务编排引擎
//!
//! 给定自然语言目标，先拆成有序的原子步骤，再逐步交给推理后端或具名工具执行，
//! 每步之后根据结果自适应重规划，直到得到最终答案或步数预算耗尽。
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 主控循环、编排状态、错误分类、构建器
//! - **engine**: Planner、Executor、prompt 模板、回复解析、过程事件
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DashScope / Scripted）
//! - **observability**: 日志初始化
//! - **plan**: Plan / Step / StepResult / StepRecord 数据模型
//! - **tools**: 工具 trait 与注册表

pub mod config;
pub mod core;
pub mod engine;
pub mod llm;
pub mod observability;
pub mod plan;
pub mod tools;
