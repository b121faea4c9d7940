//! PID controller for the Hold-mode feed ratio
//!
//! Standard-form PID tuned by proportional band: `Kp = -1/PB`,
//! `Ki = Kp/Ti`, `Kd = Kp*Td`.  The output is a raw duty-ratio candidate
//! biased by `center`; clamping to `[u_min, u_max]` is left to the caller.

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,
    center: f64,
    setpoint: f64,
    error: f64,
    integral: f64,
    derivative: f64,
    last_current: Option<f64>,
    last_update: f64,
}

impl PidController {
    pub fn new(pb: f64, ti: f64, td: f64, center: f64) -> Self {
        let mut pid = Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            center,
            setpoint: 0.0,
            error: 0.0,
            integral: 0.0,
            derivative: 0.0,
            last_current: None,
            last_update: 0.0,
        };
        pid.set_gains(pb, ti, td);
        pid
    }

    /// Recompute gains; accumulated state is kept.
    pub fn set_gains(&mut self, pb: f64, ti: f64, td: f64) {
        self.kp = -1.0 / pb;
        self.ki = self.kp / ti;
        self.kd = self.kp * td;
    }

    /// Start tracking a new setpoint from `now` (monotonic seconds).
    pub fn set_target(&mut self, setpoint: f64, now: f64) {
        self.setpoint = setpoint;
        self.error = 0.0;
        self.integral = 0.0;
        self.derivative = 0.0;
        self.last_current = None;
        self.last_update = now;
    }

    /// Compute the unclamped output for the current measurement.
    pub fn update(&mut self, current: f64, now: f64) -> f64 {
        let dt = now - self.last_update;

        self.error = current - self.setpoint;
        let p = self.kp * self.error + self.center;

        if dt > 0.0 {
            let limit = self.integral_limit();
            self.integral = (self.integral + self.error * dt).clamp(-limit, limit);
            // Derivative on measurement; none on the first sample.
            self.derivative = match self.last_current {
                Some(last) => (current - last) / dt,
                None => 0.0,
            };
        } else {
            self.derivative = 0.0;
        }
        let i = self.ki * self.integral;
        let d = self.kd * self.derivative;

        self.last_current = Some(current);
        self.last_update = now;

        p + i + d
    }

    /// `|center / Ki|`, or unbounded when the integral term is disabled.
    pub fn integral_limit(&self) -> f64 {
        if self.ki == 0.0 {
            f64::INFINITY
        } else {
            (self.center / self.ki).abs()
        }
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// `(Kp, Ki, Kd)`
    pub fn gains(&self) -> (f64, f64, f64) {
        (self.kp, self.ki, self.kd)
    }
}
